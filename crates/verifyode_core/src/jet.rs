use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Derivative jet for forward-mode AD to a fixed depth.
///
/// `derivs[k]` holds the k-th derivative with respect to the independent
/// variable, so a jet of depth `d` stores `d + 1` values. A depth-0 jet is a
/// plain scalar.
///
/// Every operation produces a fresh jet of the same depth. Combining jets of
/// different depths is a caller bug and panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    derivs: Vec<f64>,
}

impl Jet {
    /// A constant: all derivatives above order 0 vanish.
    pub fn constant(value: f64, depth: usize) -> Self {
        let mut derivs = vec![0.0; depth + 1];
        derivs[0] = value;
        Self { derivs }
    }

    /// The identity function evaluated at `value`.
    pub fn variable(value: f64, depth: usize) -> Self {
        let mut jet = Self::constant(value, depth);
        if depth > 0 {
            jet.derivs[1] = 1.0;
        }
        jet
    }

    /// Builds a jet from its value followed by its derivatives.
    ///
    /// # Panics
    /// If `derivs` is empty.
    pub fn from_derivatives(derivs: Vec<f64>) -> Self {
        assert!(!derivs.is_empty(), "a jet needs at least a value");
        Self { derivs }
    }

    pub fn depth(&self) -> usize {
        self.derivs.len() - 1
    }

    pub fn value(&self) -> f64 {
        self.derivs[0]
    }

    /// The derivative of the given order. Panics if `order > depth()`.
    pub fn derivative(&self, order: usize) -> f64 {
        self.derivs[order]
    }

    pub fn derivatives(&self) -> &[f64] {
        &self.derivs
    }

    /// The derivative of this jet as a jet one level shallower.
    /// `None` at depth 0.
    pub fn derivative_jet(&self) -> Option<Jet> {
        if self.depth() == 0 {
            return None;
        }
        Some(Self {
            derivs: self.derivs[1..].to_vec(),
        })
    }

    pub fn is_finite(&self) -> bool {
        self.derivs.iter().all(|d| d.is_finite())
    }

    /// Multiplies every derivative order by `k`.
    pub fn scale(&self, k: f64) -> Jet {
        Self {
            derivs: self.derivs.iter().map(|d| d * k).collect(),
        }
    }

    /// `exp(a)`, built bottom-up from `(e^a)' = a' e^a`.
    ///
    /// The n-th derivative only needs derivatives of `e^a` below order n,
    /// which are already in `out` when it is computed.
    pub fn exp(&self) -> Jet {
        let a = &self.derivs;
        let mut out = Vec::with_capacity(a.len());
        out.push(a[0].exp());

        let mut row = vec![1.0];
        for n in 1..a.len() {
            out.push(leibniz_term(&row, &a[1..], &out, n - 1));
            row = next_binomial_row(&row);
        }
        Self { derivs: out }
    }

    /// `(sin(a), cos(a))`, from `sin(a)' = a' cos(a)` and `cos(a)' = -a' sin(a)`.
    pub fn sin_cos(&self) -> (Jet, Jet) {
        let a = &self.derivs;
        let mut sin = Vec::with_capacity(a.len());
        let mut cos = Vec::with_capacity(a.len());
        sin.push(a[0].sin());
        cos.push(a[0].cos());

        let mut row = vec![1.0];
        for n in 1..a.len() {
            let ds = leibniz_term(&row, &a[1..], &cos, n - 1);
            let dc = -leibniz_term(&row, &a[1..], &sin, n - 1);
            sin.push(ds);
            cos.push(dc);
            row = next_binomial_row(&row);
        }
        (Self { derivs: sin }, Self { derivs: cos })
    }

    pub fn sin(&self) -> Jet {
        self.sin_cos().0
    }

    pub fn cos(&self) -> Jet {
        self.sin_cos().1
    }

    fn zip_with(&self, rhs: &Jet, f: impl Fn(f64, f64) -> f64) -> Jet {
        self.assert_same_depth(rhs);
        Self {
            derivs: self
                .derivs
                .iter()
                .zip(&rhs.derivs)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    fn assert_same_depth(&self, rhs: &Jet) {
        assert_eq!(
            self.depth(),
            rhs.depth(),
            "jet depth mismatch: {} vs {}",
            self.depth(),
            rhs.depth()
        );
    }
}

/// Order-`n` term of the Leibniz rule: `sum_k C(n,k) a[k] b[n-k]`.
/// `row` must be row `n` of Pascal's triangle.
fn leibniz_term(row: &[f64], a: &[f64], b: &[f64], n: usize) -> f64 {
    (0..=n).map(|k| row[k] * a[k] * b[n - k]).sum()
}

fn next_binomial_row(row: &[f64]) -> Vec<f64> {
    let mut next = Vec::with_capacity(row.len() + 1);
    next.push(1.0);
    for pair in row.windows(2) {
        next.push(pair[0] + pair[1]);
    }
    next.push(1.0);
    next
}

impl Add<&Jet> for &Jet {
    type Output = Jet;
    fn add(self, rhs: &Jet) -> Jet {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub<&Jet> for &Jet {
    type Output = Jet;
    fn sub(self, rhs: &Jet) -> Jet {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul<&Jet> for &Jet {
    type Output = Jet;
    /// Product rule, `(ab)^(n) = sum_k C(n,k) a^(k) b^(n-k)`.
    fn mul(self, rhs: &Jet) -> Jet {
        self.assert_same_depth(rhs);
        let mut derivs = Vec::with_capacity(self.derivs.len());
        let mut row = vec![1.0];
        for n in 0..self.derivs.len() {
            derivs.push(leibniz_term(&row, &self.derivs, &rhs.derivs, n));
            row = next_binomial_row(&row);
        }
        Jet { derivs }
    }
}

impl Mul<f64> for &Jet {
    type Output = Jet;
    fn mul(self, rhs: f64) -> Jet {
        self.scale(rhs)
    }
}

impl Mul<f64> for Jet {
    type Output = Jet;
    fn mul(self, rhs: f64) -> Jet {
        self.scale(rhs)
    }
}

impl Neg for &Jet {
    type Output = Jet;
    fn neg(self) -> Jet {
        self.scale(-1.0)
    }
}

impl Neg for Jet {
    type Output = Jet;
    fn neg(self) -> Jet {
        self.scale(-1.0)
    }
}

// Owned and mixed forms forward to the borrowed impls.
macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<Jet> for Jet {
            type Output = Jet;
            fn $method(self, rhs: Jet) -> Jet {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Jet> for Jet {
            type Output = Jet;
            fn $method(self, rhs: &Jet) -> Jet {
                (&self).$method(rhs)
            }
        }

        impl $trait<Jet> for &Jet {
            type Output = Jet;
            fn $method(self, rhs: Jet) -> Jet {
                self.$method(&rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
