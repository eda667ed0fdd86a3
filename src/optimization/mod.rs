//! optimization — argmin-backed MLE stack and numerical helpers.
//!
//! Purpose
//! -------
//! Provide the generic optimization layer used to fit CTCRW movement models:
//! a log-likelihood maximization API built on argmin's L-BFGS, guarded
//! parameter transforms for box-bounded parameters, and a unified error
//! surface. Model code implements [`loglik_optimizer::LogLikelihood`] and
//! never touches solver internals.
//!
//! Conventions
//! -----------
//! - All solvers maximize a log-likelihood `ℓ(θ)` by minimizing the cost
//!   `c(θ) = −ℓ(θ)`; user-facing values are always on the `ℓ` scale.
//! - Parameters, gradients, and Hessians use `ndarray`-based aliases
//!   (`Theta`, `Grad`, `Hessian`); mapping between working θ-space and the
//!   natural `(β, σ, τ…)` space happens in the movement layer using the
//!   transforms in [`numerical_stability`].
//! - Fallible entry points return [`errors::OptResult`]; raw argmin errors
//!   never cross module boundaries.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::{
        maximize, LogLikelihood, MLEOptions, OptimOutcome, Theta, Tolerances,
    };
}
