//! Adapter that exposes a [`LogLikelihood`] as an argmin problem.
//!
//! Maximization of `ℓ(θ)` becomes minimization of the cost `c(θ) = −ℓ(θ)`.
//! Analytic gradients, when the model provides them, are negated to match;
//! otherwise the **cost** closure is finite-differenced, so no sign flip is
//! needed on that branch.

use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a [`LogLikelihood`] to argmin's `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a model and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ) = −ℓ(θ)`, rejecting non-finite values.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.f.value(theta, self.data)?;
        if !value.is_finite() {
            return Err((OptError::NonFiniteCost { value }).into());
        }
        Ok(-value)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// With an analytic model gradient, validate it and return its negation.
    /// Without one, compute a central finite difference of the cost; if any
    /// cost evaluation failed (captured via `closure_err`, since the FD
    /// closure cannot return a `Result`) or validation rejects the result,
    /// retry once with forward differences.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_fn = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_fn);
                if closure_err.borrow().is_some() || validate_grad(&fd_grad, dim).is_err() {
                    return Ok(run_fd_diff(theta, &cost_fn, &closure_err)?);
                }
                Ok(fd_grad)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign conventions of cost and gradient for a simple concave ℓ.
    // - Finite-difference fallback when no analytic gradient exists.
    // -------------------------------------------------------------------------

    struct Quadratic;

    impl LogLikelihood for Quadratic {
        type Data = ();

        fn value(&self, theta: &Theta, _data: &()) -> OptResult<Cost> {
            Ok(-theta.dot(theta))
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // The adapter exposes c(θ) = −ℓ(θ), so a concave ℓ becomes a convex cost.
    //
    // Given
    // -----
    // - ℓ(θ) = −θ·θ and θ = (1, 2).
    //
    // Expect
    // ------
    // - cost(θ) = 5.
    fn cost_flips_sign_of_log_likelihood() {
        let adapter = ArgMinAdapter::new(&Quadratic, &());
        let theta = array![1.0, 2.0];
        assert!((adapter.cost(&theta).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic gradient, the FD fallback approximates ∇c = 2θ.
    //
    // Given
    // -----
    // - ℓ(θ) = −θ·θ and θ = (1, −3).
    //
    // Expect
    // ------
    // - gradient(θ) ≈ (2, −6) to FD accuracy.
    fn fd_gradient_matches_analytic_cost_gradient() {
        let adapter = ArgMinAdapter::new(&Quadratic, &());
        let theta = array![1.0, -3.0];
        let grad = adapter.gradient(&theta).unwrap();
        assert!((grad[0] - 2.0).abs() < 1e-5);
        assert!((grad[1] + 6.0).abs() < 1e-5);
    }
}
