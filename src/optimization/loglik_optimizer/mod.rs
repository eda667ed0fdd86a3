//! loglik_optimizer — argmin-powered log-likelihood maximization.
//!
//! Purpose
//! -------
//! High-level optimization layer for **maximizing log-likelihoods** `ℓ(θ)`.
//! Models implement [`LogLikelihood`] and call [`maximize`] with an initial
//! working-space vector, a data payload, and [`MLEOptions`]; the layer wires
//! up L-BFGS with a configurable line search, finite-difference gradient
//! fallbacks, and result normalization into [`OptimOutcome`].
//!
//! Conventions
//! -----------
//! - The optimizer always minimizes the cost `c(θ) = −ℓ(θ)` internally;
//!   models implement `ℓ(θ)` (and optionally `∇ℓ(θ)`), never the cost.
//! - Parameters live in unconstrained working space as [`Theta`]
//!   (`Array1<f64>`); any box-bound mapping happens in the model layer.
//! - Errors surface as [`OptResult`](crate::optimization::errors::OptResult);
//!   no argmin types leak out of this module.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, FnEvalMap, Grad, Hessian, Theta, DEFAULT_LBFGS_MEM};
