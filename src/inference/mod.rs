//! inference — covariance of the maximum-likelihood estimate.
//!
//! Purpose
//! -------
//! Post-estimation uncertainty quantification. This module turns the
//! curvature of the negative log-likelihood at the optimum into a full
//! covariance matrix for the free parameters, all expressed in the
//! unconstrained optimizer space `θ`.
//!
//! Key behaviors
//! -------------
//! - Build the observed information `J(θ̂)` via finite-difference Hessians
//!   of a gradient map and invert it through symmetric eigendecomposition
//!   ([`calc_covariance`]).
//! - Treat eigenvalues at or below `EIGEN_EPS` as evidence of a flat or
//!   indefinite optimum and refuse to report a covariance in that case.
//!
//! Conventions
//! -----------
//! - The gradient map passed in is that of the **negative** log-likelihood,
//!   so `J(θ̂)` is positive definite at a proper interior maximum.
//! - Errors are reported via `OptResult<T>`; no panics under documented
//!   invariants.
//!
//! Downstream usage
//! ----------------
//! - The movement model's fit routine calls [`calc_covariance`] after the
//!   optimizer converges and treats failure as a soft downgrade of the fit
//!   status rather than a fatal error.

pub mod hessian;

pub use self::hessian::calc_covariance;
