//! Estimation options for the CTCRW fit.

use crate::{
    movement::errors::{CtcrwError, CtcrwResult},
    optimization::loglik_optimizer::MLEOptions,
};

/// Configuration of the fitting procedure.
///
/// - `mle_opts`: L-BFGS configuration passed through to the optimizer.
/// - `restarts`: additional perturbed attempts after the first; the total
///   attempt budget is `1 + restarts`.
/// - `warm_start_iters`: iteration budget of the stochastic warm start run
///   before the first gradient-based attempt; `0` disables it.
/// - `warm_start_scale` / `restart_scale`: standard deviations of the
///   Gaussian perturbations applied in working space.
/// - `seed`: seeds every stochastic component, making fits reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct CtcrwOptions {
    pub mle_opts: MLEOptions,
    pub restarts: usize,
    pub warm_start_iters: usize,
    pub warm_start_scale: f64,
    pub restart_scale: f64,
    pub seed: u64,
}

impl CtcrwOptions {
    /// Construct validated options.
    ///
    /// # Errors
    /// [`CtcrwError::InvalidOptions`] when a perturbation scale is
    /// non-finite or not strictly positive.
    pub fn new(
        mle_opts: MLEOptions,
        restarts: usize,
        warm_start_iters: usize,
        warm_start_scale: f64,
        restart_scale: f64,
        seed: u64,
    ) -> CtcrwResult<Self> {
        for (name, scale) in [("warm_start_scale", warm_start_scale), ("restart_scale", restart_scale)] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(CtcrwError::InvalidOptions {
                    text: format!("{name} must be finite and positive, got {scale}"),
                });
            }
        }
        Ok(Self { mle_opts, restarts, warm_start_iters, warm_start_scale, restart_scale, seed })
    }
}

impl Default for CtcrwOptions {
    fn default() -> Self {
        Self {
            mle_opts: MLEOptions::default(),
            restarts: 2,
            warm_start_iters: 0,
            warm_start_scale: 0.5,
            restart_scale: 0.5,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Perturbation scale validation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Non-positive perturbation scales are rejected; defaults validate.
    fn scales_must_be_positive() {
        let mle = MLEOptions::default();
        assert!(matches!(
            CtcrwOptions::new(mle.clone(), 1, 10, 0.0, 0.5, 7),
            Err(CtcrwError::InvalidOptions { .. })
        ));
        assert!(matches!(
            CtcrwOptions::new(mle.clone(), 1, 10, 0.5, f64::NAN, 7),
            Err(CtcrwError::InvalidOptions { .. })
        ));
        let d = CtcrwOptions::default();
        assert!(CtcrwOptions::new(
            mle,
            d.restarts,
            d.warm_start_iters,
            d.warm_start_scale,
            d.restart_scale,
            d.seed
        )
        .is_ok());
    }
}
