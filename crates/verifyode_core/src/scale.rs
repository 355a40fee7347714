use crate::error::ContractViolation;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Tolerance used when no scale is given.
pub const DEFAULT_MAX_ERROR: f64 = 1e-11;

/// Sampling magnitudes and tolerance for a verification run.
///
/// Constants are drawn from `[-const_magnitude[i], const_magnitude[i]]` and
/// the independent variable from `[-var_magnitude, var_magnitude]`.
///
/// `max_error` is an absolute bound on `|residual - output|`. Many systems
/// have outputs of exactly 0, and nothing can be compared relatively to 0.
/// Larger magnitudes amplify rounding in the product and exp recursions, so
/// systems with large constants or coefficients may need a looser bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    #[serde(default)]
    pub const_magnitude: Vec<f64>,
    #[serde(default = "unit_magnitude")]
    pub var_magnitude: f64,
    #[serde(default = "default_max_error")]
    pub max_error: f64,
}

fn unit_magnitude() -> f64 {
    1.0
}

fn default_max_error() -> f64 {
    DEFAULT_MAX_ERROR
}

impl Scale {
    /// Magnitude 1 for the variable and every constant, default tolerance.
    pub fn uniform(num_constants: usize) -> Self {
        Self {
            const_magnitude: vec![1.0; num_constants],
            var_magnitude: 1.0,
            max_error: DEFAULT_MAX_ERROR,
        }
    }

    pub fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = max_error;
        self
    }

    pub fn with_var_magnitude(mut self, var_magnitude: f64) -> Self {
        self.var_magnitude = var_magnitude;
        self
    }

    /// Checks the scale against a solution with `num_constants` constants.
    pub fn validate(&self, num_constants: usize) -> Result<()> {
        if self.const_magnitude.len() != num_constants {
            return Err(ContractViolation::ConstantMagnitudeCount {
                expected: num_constants,
                got: self.const_magnitude.len(),
            }
            .into());
        }
        for (i, &m) in self.const_magnitude.iter().enumerate() {
            if !is_magnitude(m) {
                return Err(ContractViolation::InvalidScale(format!(
                    "constant {i} magnitude {m} must be finite and non-negative"
                ))
                .into());
            }
        }
        if !is_magnitude(self.var_magnitude) {
            return Err(ContractViolation::InvalidScale(format!(
                "variable magnitude {} must be finite and non-negative",
                self.var_magnitude
            ))
            .into());
        }
        if !is_magnitude(self.max_error) {
            return Err(ContractViolation::InvalidScale(format!(
                "max_error {} must be finite and non-negative",
                self.max_error
            ))
            .into());
        }
        Ok(())
    }
}

fn is_magnitude(m: f64) -> bool {
    m.is_finite() && m >= 0.0
}
