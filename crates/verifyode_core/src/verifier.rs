//! Randomized verification of candidate solutions.
//!
//! Each trial samples the independent variable and every free constant,
//! evaluates all candidates into jets of the system's depth, folds each
//! equation's operators over those jets and compares against the equation's
//! output with an absolute tolerance.
//!
//! Passing every trial is strong statistical evidence, not a proof: a wrong
//! candidate can coincide with a correct one on every sampled point.

use crate::error::ContractViolation;
use crate::jet::Jet;
use crate::rng::{fresh_seed, TrialInput, TrialSampler};
use crate::scale::Scale;
use crate::system::{Solution, System};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Trials drawn from one sampling stream.
pub const TRIALS_PER_CHUNK: usize = 64;

/// Inputs and outcome of one failing trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSample {
    pub trial: usize,
    pub x: f64,
    pub constants: Vec<f64>,
    pub residual: f64,
    pub expected: f64,
}

/// Outcome of one equation across a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationReport {
    /// True iff every trial was within tolerance.
    pub satisfied: bool,
    pub failed_trials: usize,
    /// Trials where the residual or its error was NaN or infinite.
    pub non_finite_trials: usize,
    /// Largest finite `|residual - expected|` seen.
    pub max_abs_error: f64,
    /// The earliest failing trial.
    pub first_failure: Option<TrialSample>,
}

impl EquationReport {
    fn new() -> Self {
        Self {
            satisfied: true,
            failed_trials: 0,
            non_finite_trials: 0,
            max_abs_error: 0.0,
            first_failure: None,
        }
    }

    fn record(
        &mut self,
        trial: usize,
        input: &TrialInput,
        residual: f64,
        expected: f64,
        max_error: f64,
    ) {
        let error = (residual - expected).abs();
        if error.is_finite() {
            self.max_abs_error = self.max_abs_error.max(error);
        } else {
            self.non_finite_trials += 1;
        }

        // A non-finite residual fails whatever the tolerance; so does a NaN
        // error such as inf - inf.
        let failed = !residual.is_finite() || error.is_nan() || error > max_error;
        if !failed {
            return;
        }
        self.satisfied = false;
        self.failed_trials += 1;
        if self.first_failure.is_none() {
            self.first_failure = Some(TrialSample {
                trial,
                x: input.x,
                constants: input.constants.clone(),
                residual,
                expected,
            });
        }
    }

    /// Combines reports over disjoint sets of trials.
    ///
    /// Commutative and monotone: once either side is unsatisfied the result
    /// is unsatisfied.
    pub fn merge(self, other: Self) -> Self {
        let first_failure = match (self.first_failure, other.first_failure) {
            (Some(a), Some(b)) => Some(if b.trial < a.trial { b } else { a }),
            (a, b) => a.or(b),
        };
        Self {
            satisfied: self.satisfied && other.satisfied,
            failed_trials: self.failed_trials + other.failed_trials,
            non_finite_trials: self.non_finite_trials + other.non_finite_trials,
            max_abs_error: self.max_abs_error.max(other.max_abs_error),
            first_failure,
        }
    }
}

/// Result of a verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Master seed; rerunning with it replays the same trials.
    pub seed: u64,
    pub trials: usize,
    /// Jet depth used, i.e. the system's highest derivative order.
    pub depth: usize,
    pub equations: Vec<EquationReport>,
}

impl VerificationReport {
    /// One flag per equation, true iff that equation held in every trial.
    pub fn passed(&self) -> Vec<bool> {
        self.equations.iter().map(|eq| eq.satisfied).collect()
    }

    pub fn all_satisfied(&self) -> bool {
        self.equations.iter().all(|eq| eq.satisfied)
    }
}

/// Settings for a verification run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Verifier {
    pub trials: usize,
    /// Master seed. A fresh one is drawn per run when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Verifier {
    pub fn new(trials: usize) -> Self {
        Self { trials, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Runs the configured number of trials.
    ///
    /// With no `scale`, the variable and every constant are sampled with
    /// magnitude 1 and the tolerance is `DEFAULT_MAX_ERROR`.
    ///
    /// Any contract violation aborts the run with no partial result.
    /// Non-finite residuals only fail the affected equation.
    pub fn run(
        &self,
        system: &System,
        solution: &Solution,
        scale: Option<&Scale>,
    ) -> Result<VerificationReport> {
        if self.trials == 0 {
            return Err(ContractViolation::NoTrials.into());
        }
        if solution.len() != system.size() {
            return Err(ContractViolation::CandidateCount {
                size: system.size(),
                got: solution.len(),
            }
            .into());
        }

        let default_scale;
        let scale = match scale {
            Some(scale) => scale,
            None => {
                default_scale = Scale::uniform(solution.num_constants());
                &default_scale
            }
        };
        scale.validate(solution.num_constants())?;

        let depth = system.depth();
        for (unknown, candidate) in solution.candidates().iter().enumerate() {
            if let Some(supported) = candidate.max_depth() {
                if supported < depth {
                    return Err(ContractViolation::CandidateTooShallow {
                        unknown,
                        supported,
                        required: depth,
                    }
                    .into());
                }
            }
        }

        let seed = self.seed.unwrap_or_else(fresh_seed);
        let run = Run {
            system,
            solution,
            scale,
            depth,
            seed,
            trials: self.trials,
        };
        let equations = run.all_chunks()?;

        Ok(VerificationReport {
            seed,
            trials: self.trials,
            depth,
            equations,
        })
    }
}

/// Verifies `solution` against `system` over `trials` random trials.
///
/// Returns one flag per equation, set iff the equation was satisfied within
/// `scale.max_error` (absolute) in every trial. A `true` flag is statistical
/// evidence only; see the module documentation.
pub fn verify(
    system: &System,
    solution: &Solution,
    trials: usize,
    scale: Option<&Scale>,
) -> Result<Vec<bool>> {
    Ok(Verifier::new(trials).run(system, solution, scale)?.passed())
}

struct Run<'a> {
    system: &'a System,
    solution: &'a Solution,
    scale: &'a Scale,
    depth: usize,
    seed: u64,
    trials: usize,
}

impl Run<'_> {
    fn chunk_count(&self) -> usize {
        self.trials.div_ceil(TRIALS_PER_CHUNK)
    }

    fn empty(&self) -> Vec<EquationReport> {
        vec![EquationReport::new(); self.system.size()]
    }

    fn chunk(&self, chunk: usize) -> Result<Vec<EquationReport>> {
        let mut sampler = TrialSampler::for_chunk(self.seed, chunk as u64);
        let mut reports = self.empty();

        let start = chunk * TRIALS_PER_CHUNK;
        let end = (start + TRIALS_PER_CHUNK).min(self.trials);
        for trial in start..end {
            let input = sampler.sample(self.scale);
            let t = Jet::variable(input.x, self.depth);
            let constants: Vec<Jet> = input
                .constants
                .iter()
                .map(|&k| Jet::constant(k, self.depth))
                .collect();
            let unknowns = self.solution.evaluate(&t, &constants)?;

            for (equation, report) in reports.iter_mut().enumerate() {
                let residual = self.system.residual(equation, &unknowns);
                let expected = self.system.output(equation, input.x);
                report.record(trial, &input, residual, expected, self.scale.max_error);
            }
        }
        Ok(reports)
    }

    #[cfg(not(feature = "parallel"))]
    fn all_chunks(&self) -> Result<Vec<EquationReport>> {
        (0..self.chunk_count()).try_fold(self.empty(), |acc, chunk| {
            Ok(merge_all(acc, self.chunk(chunk)?))
        })
    }

    #[cfg(feature = "parallel")]
    fn all_chunks(&self) -> Result<Vec<EquationReport>> {
        use rayon::prelude::*;

        (0..self.chunk_count())
            .into_par_iter()
            .map(|chunk| self.chunk(chunk))
            .try_reduce(|| self.empty(), |a, b| Ok(merge_all(a, b)))
    }
}

fn merge_all(a: Vec<EquationReport>, b: Vec<EquationReport>) -> Vec<EquationReport> {
    a.into_iter().zip(b).map(|(x, y)| x.merge(y)).collect()
}
