//! Numerical stability utilities.
//!
//! Safe implementations of the nonlinear transforms used to map box-bounded
//! natural parameters (mean-reversion rate, diffusion scale, measurement
//! scales) into the optimizer's unconstrained working space. The functions
//! use explicit cutoffs (`|x| > 20.0`) to keep `f64` arithmetic in a
//! well-conditioned regime, following the guarded strategy common in ML
//! libraries.
//!
//! # Provided items
//! - [`EIGEN_EPS`]: truncation threshold for eigenvalues of the observed
//!   information matrix; eigenvalues at or below it are treated as zero.
//! - [`safe_softplus`] / [`safe_softplus_inv`]: stable `ln(1 + exp(x))` and
//!   its inverse, mapping ℝ ↔ (0, ∞) for lower-bounded parameters.
//! - [`safe_logistic`] / [`safe_logit`]: stable sigmoid and its inverse,
//!   mapping ℝ ↔ (0, 1) for two-sided box bounds.

/// Eigenvalue truncation threshold for observed-information pseudoinverses.
///
/// An information matrix whose smallest eigenvalue does not exceed this
/// bound is considered singular; the estimator treats such a fit attempt as
/// not converged because no parameter covariance can be computed.
pub const EIGEN_EPS: f64 = 1e-10;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// For large positive `x` the result is `x` to machine precision, so the
/// exponential is skipped entirely; otherwise `ln_1p(exp(x))` is used. The
/// cutoff `x > 20.0` keeps `f64` arithmetic well conditioned on both sides.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Stable inverse of softplus on `(0, ∞)`: solves `softplus(t) = x` for `t`.
///
/// Direct evaluation of `ln(exp(x) − 1)` overflows for large `x` and loses
/// precision near zero; this mirrors the guard in [`safe_softplus`] and
/// falls back to `ln(expm1(x))` below the cutoff.
///
/// The input must be finite and strictly positive; callers validate this.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 {
        x
    } else {
        x.exp_m1().ln()
    }
}

/// Numerically stable logistic function `1 / (1 + exp(−x))`.
///
/// Evaluated via the branch that only exponentiates a non-positive value,
/// avoiding overflow for large `|x|`.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Stable logit on `(0, 1)`: inverse of [`safe_logistic`].
///
/// Inputs are clamped a hair inside the open interval so that values that
/// round to exactly 0 or 1 (e.g. a free parameter initialized on a box
/// boundary) do not produce infinities.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    (p / (1.0 - p)).ln()
}
