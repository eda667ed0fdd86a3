//! Finite-difference gradient and Hessian helpers.
//!
//! Wraps the `finitediff` API with error capture, validation, and symmetry
//! cleanup so the rest of the optimizer can request derivatives without
//! depending on it directly. Central differences are preferred; forward
//! differences are the fallback when the central approximation fails
//! validation.

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        types::{Grad, Hessian, Theta},
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient with error capture and validation.
///
/// The FD closure cannot return a `Result`, so `func` is expected to write
/// any evaluation error into `closure_err` and return `NaN`. This helper
/// clears the cell, runs the forward difference, surfaces any captured
/// error, and validates the resulting gradient.
///
/// # Errors
/// - Any error captured in `closure_err` during evaluation.
/// - [`validate_grad`] failures (dimension mismatch, non-finite entries).
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta,
    func: &G,
    closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Finite-difference Hessian of a gradient map, validated and symmetrized.
///
/// A central-difference Hessian is attempted first; if it fails validation
/// (shape or finiteness), a forward-difference Hessian is computed and
/// validated instead. The accepted matrix is symmetrized in place by
/// averaging off-diagonal pairs.
///
/// # Errors
/// - [`validate_hessian`] failures on the forward-difference fallback.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut central = theta.central_hessian(f);
    match validate_hessian(&central, dim) {
        Ok(()) => {
            symmetrize_hess(&mut central);
            Ok(central)
        }
        Err(_) => {
            let mut forward = theta.forward_hessian(f);
            validate_hessian(&forward, dim)?;
            symmetrize_hess(&mut forward);
            Ok(forward)
        }
    }
}

/// Replace each off-diagonal pair with its average; diagonal untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use ndarray::Array1;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - FD gradients for a clean quadratic and for error-capturing closures.
    // - Hessian construction, symmetry, and the non-finite failure path.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A quadratic objective yields a finite FD gradient of the right length.
    fn fd_gradient_of_quadratic_is_finite() {
        let theta: Theta = Array1::from(vec![0.5, -1.5]);
        let closure_err = RefCell::new(None);
        let f = |x: &Theta| x.dot(x);

        let grad = run_fd_diff(&theta, &f, &closure_err).unwrap();

        assert_eq!(grad.len(), 2);
        assert!(grad.iter().all(|v| v.is_finite()));
    }

    #[test]
    // Purpose
    // -------
    // An always-NaN objective produces an InvalidGradient error rather than
    // silently returning NaNs.
    fn fd_gradient_rejects_nan_objective() {
        let theta: Theta = Array1::from(vec![0.0, 1.0]);
        let closure_err = RefCell::new(None);
        let f = |_: &Theta| f64::NAN;

        let err = run_fd_diff(&theta, &f, &closure_err).unwrap_err();
        assert!(matches!(err, OptError::InvalidGradient { .. }));
    }

    #[test]
    // Purpose
    // -------
    // compute_hessian on the gradient of ||θ||² returns ≈ 2I, symmetric.
    fn hessian_of_quadratic_is_twice_identity() {
        let theta: Theta = Array1::from(vec![1.0, 2.0]);
        let grad_fn = |t: &Theta| t.mapv(|x| 2.0 * x);

        let hess = compute_hessian(&grad_fn, &theta).unwrap();

        assert_eq!(hess.shape(), &[2, 2]);
        assert!((hess[[0, 0]] - 2.0).abs() < 1e-5);
        assert!((hess[[1, 1]] - 2.0).abs() < 1e-5);
        assert!((hess[[0, 1]] - hess[[1, 0]]).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A NaN-valued gradient map fails both FD paths with InvalidHessian.
    fn hessian_of_nan_gradient_fails() {
        let theta: Theta = Array1::from(vec![0.0]);
        let grad_fn = |_: &Theta| Array1::from(vec![f64::NAN]);

        let err = compute_hessian(&grad_fn, &theta).unwrap_err();
        assert!(matches!(err, OptError::InvalidHessian { .. }));
    }
}
