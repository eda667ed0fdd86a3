//! Validation helpers for log-likelihood optimization.
//!
//! Centralizes the consistency checks used across the optimizer interface:
//! tolerance sanity, gradient shape/finiteness, Hessian shape/finiteness,
//! and final estimate checks. Every helper reports failures through
//! domain-specific [`OptError`] variants.

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::types::{Grad, Hessian, Theta},
};

/// Validate the optional gradient-norm tolerance.
///
/// Accepts `None` (no gradient stopping rule); a present value must be
/// finite and strictly positive.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "tolerance must be finite" });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "tolerance must be positive" });
        }
    }
    Ok(())
}

/// Validate the optional cost-change tolerance.
///
/// Accepts `None`; a present value must be finite and strictly positive.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "tolerance must be finite" });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "tolerance must be positive" });
        }
    }
    Ok(())
}

/// Validate a gradient's dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] when the length differs from `dim`.
/// - [`OptError::InvalidGradient`] for the first non-finite entry.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient { index, value });
        }
    }
    Ok(())
}

/// Validate a Hessian's dimensions and finiteness.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] when the shape is not `dim × dim`.
/// - [`OptError::InvalidHessian`] for the first non-finite entry.
pub fn validate_hessian(hess: &Hessian, dim: usize) -> OptResult<()> {
    if hess.nrows() != dim || hess.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hess.nrows(), hess.ncols()),
        });
    }
    for ((row, col), &value) in hess.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row, col, value });
        }
    }
    Ok(())
}

/// Validate the solver's best parameter vector: present and all finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta_hat = theta_hat.ok_or(OptError::MissingThetaHat)?;
    for (index, &value) in theta_hat.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat { index, value });
        }
    }
    Ok(theta_hat)
}

/// Validate a scalar log-likelihood value for finiteness.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Acceptance of valid tolerances, gradients, Hessians, and estimates.
    // - Rejection of non-finite and mis-shaped inputs with the right variant.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Valid and absent tolerances pass; non-positive and non-finite fail.
    fn tolerance_checks_accept_and_reject_correctly() {
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_grad(Some(1e-6)).is_ok());
        assert!(matches!(verify_tol_grad(Some(0.0)), Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(verify_tol_cost(Some(f64::NAN)), Err(OptError::InvalidTolCost { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Gradient validation flags dimension mismatches and non-finite entries.
    fn validate_grad_flags_shape_and_nan() {
        let good = array![1.0, -2.0];
        assert!(validate_grad(&good, 2).is_ok());
        assert!(matches!(
            validate_grad(&good, 3),
            Err(OptError::GradientDimMismatch { expected: 3, found: 2 })
        ));
        let bad = array![1.0, f64::INFINITY];
        assert!(matches!(validate_grad(&bad, 2), Err(OptError::InvalidGradient { index: 1, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Hessian validation flags shape mismatches and non-finite entries;
    // theta_hat validation flags absence and non-finite coordinates.
    fn validate_hessian_and_theta_hat() {
        let h = Array2::<f64>::eye(2);
        assert!(validate_hessian(&h, 2).is_ok());
        assert!(matches!(validate_hessian(&h, 3), Err(OptError::HessianDimMismatch { .. })));

        assert!(matches!(validate_theta_hat(None), Err(OptError::MissingThetaHat)));
        let bad = array![0.0, f64::NAN];
        assert!(matches!(validate_theta_hat(Some(bad)), Err(OptError::InvalidThetaHat { .. })));
    }
}
