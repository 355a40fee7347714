use crate::jet::Jet;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be accumulated by the compensated summer.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A candidate solution for one unknown of a system (an infinitely
/// differentiable function of one variable).
///
/// The function also takes the sampled free constants. Constants are passed
/// as constant jets so they can be combined with `t` directly; the function is
/// never differentiated with respect to them.
///
/// The returned jet must be exactly as deep as `t`.
pub trait Candidate: Send + Sync {
    /// Evaluates the candidate and all of its derivatives at `t`.
    fn evaluate(&self, t: &Jet, constants: &[Jet]) -> Jet;

    /// Highest derivative order this candidate can produce correctly.
    /// `None` means unbounded.
    fn max_depth(&self) -> Option<usize> {
        None
    }
}

impl<F> Candidate for F
where
    F: Fn(&Jet, &[Jet]) -> Jet + Send + Sync,
{
    fn evaluate(&self, t: &Jet, constants: &[Jet]) -> Jet {
        self(t, constants)
    }
}

/// Right-hand side of one equation: a plain function of the independent
/// variable which needn't be differentiable.
pub trait Forcing: Send + Sync {
    fn apply(&self, t: f64) -> f64;
}

impl<F> Forcing for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn apply(&self, t: f64) -> f64 {
        self(t)
    }
}
