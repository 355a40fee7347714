//! The `verifyode_core` crate checks proposed solutions of linear ODE systems
//! whose coefficients are polynomials in the differentiation operator D.
//!
//! Given a `System` (coefficients and right-hand sides) and a `Solution` (one
//! candidate function per unknown, possibly with free constants), the
//! verifier samples random points and constants, evaluates the candidates
//! with forward-mode AD, substitutes them into every equation and reports
//! per equation whether it held within an absolute tolerance in every trial.
//!
//! This is a statistical check, not a proof: a false solution can match the
//! true one on every sampled point.
//!
//! Key components:
//! - **Jet**: a value with its derivatives up to a fixed depth, closed under
//!   add, subtract, scale, multiply, exp, sin and cos.
//! - **Traits**: `Scalar` (numeric abstraction), `Candidate` and `Forcing`
//!   (the caller-supplied functions).
//! - **Verifier**: the randomized trial loop and its report.
pub mod error;
pub mod jet;
pub mod rng;
pub mod scale;
pub mod summation;
pub mod system;
pub mod traits;
#[cfg(test)]
mod test_support;
pub mod verifier;
