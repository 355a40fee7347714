use crate::error::ContractViolation;
use crate::jet::Jet;
use crate::summation::KahanSum;
use crate::traits::{Candidate, Forcing};
use anyhow::Result;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A polynomial in the differentiation operator D.
///
/// The n-th element is the coefficient of D^n, so `[1, 2, -2, 1]` is the
/// operator `1 + 2D - 2D^2 + D^3`. An empty polynomial is the zero operator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffPoly(Vec<f64>);

impl DiffPoly {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self(coefficients)
    }

    pub fn zero() -> Self {
        Self(Vec::new())
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.0
    }

    /// Highest derivative taken, `None` for the zero operator.
    pub fn order(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    /// Adds every term `c[k] * f^(k)` to `sum`.
    ///
    /// `jet` must be at least as deep as `order()`.
    pub fn accumulate(&self, jet: &Jet, sum: &mut KahanSum<f64>) {
        for (k, &c) in self.0.iter().enumerate() {
            sum.add(c * jet.derivative(k));
        }
    }
}

impl From<Vec<f64>> for DiffPoly {
    fn from(coefficients: Vec<f64>) -> Self {
        Self(coefficients)
    }
}

impl From<&[f64]> for DiffPoly {
    fn from(coefficients: &[f64]) -> Self {
        Self(coefficients.to_vec())
    }
}

/// A square system of linear ODEs.
///
/// A size-N system has N unknowns, N equations and N outputs. For example
///
/// ```text
///     (D-1)x + (D+1)y = e^t
///     (D^2)x +     4y = 2e^(-t)
/// ```
///
/// has unknowns x and y, coefficients (D-1), (D+1), D^2 and 4, and outputs
/// e^t and 2e^(-t).
pub struct System {
    /// Row i holds the coefficients of equation i.
    coefficients: DMatrix<DiffPoly>,
    outputs: Vec<Box<dyn Forcing>>,
}

impl System {
    /// `coefficients` is unrolled left to right, then top to bottom.
    pub fn new(
        size: usize,
        coefficients: Vec<DiffPoly>,
        outputs: Vec<Box<dyn Forcing>>,
    ) -> Result<Self> {
        if coefficients.len() != size * size {
            return Err(ContractViolation::CoefficientCount {
                size,
                expected: size * size,
                got: coefficients.len(),
            }
            .into());
        }
        if outputs.len() != size {
            return Err(ContractViolation::OutputCount {
                size,
                got: outputs.len(),
            }
            .into());
        }
        Ok(Self {
            coefficients: DMatrix::from_row_slice(size, size, &coefficients),
            outputs,
        })
    }

    /// A system whose outputs are all zero.
    pub fn homogeneous(size: usize, coefficients: Vec<DiffPoly>) -> Result<Self> {
        let outputs = (0..size)
            .map(|_| Box::new(|_t: f64| 0.0) as Box<dyn Forcing>)
            .collect();
        Self::new(size, coefficients, outputs)
    }

    pub fn size(&self) -> usize {
        self.outputs.len()
    }

    /// The maximum number of derivatives any coefficient takes.
    /// 0 if the system takes no derivatives.
    pub fn depth(&self) -> usize {
        self.coefficients
            .iter()
            .filter_map(DiffPoly::order)
            .max()
            .unwrap_or(0)
    }

    pub fn coefficient(&self, equation: usize, unknown: usize) -> &DiffPoly {
        &self.coefficients[(equation, unknown)]
    }

    /// Expected value of `equation` at `t`.
    pub fn output(&self, equation: usize, t: f64) -> f64 {
        self.outputs[equation].apply(t)
    }

    /// Left-hand side of `equation` given one jet per unknown.
    ///
    /// All terms of the double sum go through one compensated summer, since
    /// correct solutions usually cancel to (nearly) zero.
    pub fn residual(&self, equation: usize, unknowns: &[Jet]) -> f64 {
        let mut sum = KahanSum::new();
        for (j, unknown) in unknowns.iter().enumerate() {
            self.coefficients[(equation, j)].accumulate(unknown, &mut sum);
        }
        sum.sum()
    }
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("size", &self.size())
            .field("coefficients", &self.coefficients)
            .finish_non_exhaustive()
    }
}

/// A set of functions which supposedly solve a system, one per unknown.
/// The functions may share free constants which can be set to anything.
pub struct Solution {
    candidates: Vec<Box<dyn Candidate>>,
    num_constants: usize,
}

impl Solution {
    pub fn new(num_constants: usize) -> Self {
        Self {
            candidates: Vec::new(),
            num_constants,
        }
    }

    pub fn from_candidates(candidates: Vec<Box<dyn Candidate>>, num_constants: usize) -> Self {
        Self {
            candidates,
            num_constants,
        }
    }

    /// Appends the candidate for the next unknown.
    pub fn with_candidate(mut self, candidate: impl Candidate + 'static) -> Self {
        self.candidates.push(Box::new(candidate));
        self
    }

    pub fn num_constants(&self) -> usize {
        self.num_constants
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Box<dyn Candidate>] {
        &self.candidates
    }

    /// Evaluates every candidate at `t`. Each result must be as deep as `t`.
    pub fn evaluate(&self, t: &Jet, constants: &[Jet]) -> Result<Vec<Jet>> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(unknown, candidate)| -> Result<Jet> {
                let jet = candidate.evaluate(t, constants);
                if jet.depth() != t.depth() {
                    return Err(ContractViolation::CandidateDepth {
                        unknown,
                        expected: t.depth(),
                        got: jet.depth(),
                    }
                    .into());
                }
                Ok(jet)
            })
            .collect()
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solution")
            .field("candidates", &self.candidates.len())
            .field("num_constants", &self.num_constants)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::polys;
    use approx::assert_abs_diff_eq;

    fn constant_candidate(t: &Jet, constants: &[Jet]) -> Jet {
        Jet::constant(constants[0].value(), t.depth())
    }

    fn shallow_candidate(_t: &Jet, _constants: &[Jet]) -> Jet {
        Jet::constant(1.0, 0)
    }

    #[test]
    fn diff_poly_order() {
        assert_eq!(DiffPoly::zero().order(), None);
        assert_eq!(DiffPoly::new(vec![4.0]).order(), Some(0));
        assert_eq!(DiffPoly::new(vec![1.0, 2.0, -2.0, 1.0]).order(), Some(3));
    }

    #[test]
    fn diff_poly_applies_operator_to_jet() {
        // (1 + 2D - 2D^2 + D^3) e^t = 2 e^t
        let x = 0.5;
        let jet = Jet::variable(x, 3).exp();
        let mut sum = KahanSum::new();
        DiffPoly::new(vec![1.0, 2.0, -2.0, 1.0]).accumulate(&jet, &mut sum);
        assert_abs_diff_eq!(sum.sum(), 2.0 * x.exp(), epsilon = 1e-14);
    }

    #[test]
    fn depth_is_highest_derivative_order() {
        let system = System::homogeneous(
            2,
            polys(&[&[], &[0.0, 1.0, 1.0], &[2.0, 2.0], &[0.0, 0.0, 1.0]]),
        )
        .expect("valid system");
        assert_eq!(system.depth(), 2);

        let algebraic = System::homogeneous(2, polys(&[&[1.0], &[], &[3.0], &[-1.0]]))
            .expect("valid system");
        assert_eq!(algebraic.depth(), 0);

        let empty = System::homogeneous(1, polys(&[&[]])).expect("valid system");
        assert_eq!(empty.depth(), 0);
    }

    #[test]
    fn coefficients_are_row_major() {
        let system = System::homogeneous(2, polys(&[&[1.0], &[2.0], &[3.0], &[4.0]]))
            .expect("valid system");
        assert_eq!(system.coefficient(0, 1).coefficients(), &[2.0]);
        assert_eq!(system.coefficient(1, 0).coefficients(), &[3.0]);
    }

    #[test]
    fn new_rejects_wrong_dimensions() {
        let err = System::homogeneous(2, polys(&[&[1.0], &[2.0], &[3.0]])).expect_err("3 != 4");
        assert_eq!(
            err.downcast_ref::<ContractViolation>(),
            Some(&ContractViolation::CoefficientCount {
                size: 2,
                expected: 4,
                got: 3
            })
        );

        let outputs: Vec<Box<dyn Forcing>> = vec![Box::new(|t: f64| t)];
        let err = System::new(2, polys(&[&[1.0], &[2.0], &[3.0], &[4.0]]), outputs)
            .expect_err("1 output for 2 equations");
        assert_eq!(
            err.downcast_ref::<ContractViolation>(),
            Some(&ContractViolation::OutputCount { size: 2, got: 1 })
        );
    }

    #[test]
    fn residual_sums_every_term_of_the_row() {
        // row 0: (D)x + (1 + D)y with x = t^2, y = e^t
        let system = System::homogeneous(2, polys(&[&[0.0, 1.0], &[1.0, 1.0], &[], &[]]))
            .expect("valid system");
        let t = Jet::variable(0.8, 1);
        let unknowns = vec![&t * &t, t.exp()];
        let expected = 2.0 * 0.8 + 2.0 * 0.8_f64.exp();
        assert_abs_diff_eq!(system.residual(0, &unknowns), expected, epsilon = 1e-14);
        assert_eq!(system.residual(1, &unknowns), 0.0);
    }

    #[test]
    fn outputs_are_evaluated_per_equation() {
        let outputs = vec![
            Box::new(|t: f64| t.exp()) as Box<dyn Forcing>,
            Box::new(|t: f64| 2.0 * (-t).exp()),
        ];
        let coefficients = polys(&[&[-1.0, 1.0], &[1.0, 1.0], &[0.0, 0.0, 1.0], &[4.0]]);
        let system = System::new(2, coefficients, outputs).expect("valid system");
        assert_eq!(system.output(0, 0.0), 1.0);
        assert_eq!(system.output(1, 0.0), 2.0);
    }

    #[test]
    fn solution_evaluate_checks_depth() {
        let t = Jet::variable(0.1, 2);
        let constants = vec![Jet::constant(3.0, 2)];

        let candidates: Vec<Box<dyn Candidate>> = vec![Box::new(constant_candidate)];
        let good = Solution::from_candidates(candidates, 1);
        let jets = good.evaluate(&t, &constants).expect("depth matches");
        assert_eq!(jets[0].derivatives(), &[3.0, 0.0, 0.0]);

        let bad = Solution::new(1)
            .with_candidate(constant_candidate)
            .with_candidate(shallow_candidate);
        let err = bad.evaluate(&t, &constants).expect_err("depth 0 jet");
        assert_eq!(
            err.downcast_ref::<ContractViolation>(),
            Some(&ContractViolation::CandidateDepth {
                unknown: 1,
                expected: 2,
                got: 0
            })
        );
    }
}
