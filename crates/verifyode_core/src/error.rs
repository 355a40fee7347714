use thiserror::Error;

/// Caller misuse detected before or during verification.
///
/// These are not verification outcomes: any of them aborts the run with no
/// partial result. Public entry points return them wrapped in
/// `anyhow::Error`; use `downcast_ref::<ContractViolation>()` to match.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("system of size {size} needs {expected} coefficients, got {got}")]
    CoefficientCount {
        size: usize,
        expected: usize,
        got: usize,
    },

    #[error("system of size {size} needs {size} outputs, got {got}")]
    OutputCount { size: usize, got: usize },

    #[error("system of size {size} needs {size} candidate functions, got {got}")]
    CandidateCount { size: usize, got: usize },

    #[error("scale has {got} constant magnitudes but the solution has {expected} constants")]
    ConstantMagnitudeCount { expected: usize, got: usize },

    #[error("invalid scale: {0}")]
    InvalidScale(String),

    #[error("candidate {unknown} supports derivative depth {supported}, system needs {required}")]
    CandidateTooShallow {
        unknown: usize,
        supported: usize,
        required: usize,
    },

    #[error("candidate {unknown} returned a jet of depth {got}, expected {expected}")]
    CandidateDepth {
        unknown: usize,
        expected: usize,
        got: usize,
    },

    #[error("verification needs at least one trial")]
    NoTrials,
}
