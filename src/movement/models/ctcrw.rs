//! CTCRW model: likelihood evaluation, estimation, and prediction.
//!
//! This module wires the CTCRW specification to the `LogLikelihood` trait
//! and implements the estimator on top of it:
//!
//! - `value` unpacks the working vector into natural parameters, runs the
//!   Kalman forward pass over the observation times, and returns the exact
//!   Gaussian log-likelihood. A degenerate trial (non-positive-definite
//!   innovation covariance) is absorbed as the finite penalty
//!   [`PENALTY_LOGLIK`] so the optimizer is steered away without aborting.
//! - `fit` optionally runs a seeded stochastic warm start, then up to
//!   `1 + restarts` L-BFGS attempts from perturbed starting points. An
//!   attempt counts as converged only when the solver terminates **and**
//!   the observed information at the optimum is invertible, so every
//!   converged [`FitResult`] carries a usable parameter covariance.
//! - `predict` refuses non-converged fits and otherwise produces a smoothed
//!   [`Track`] over the union of observation and prediction-grid times.

use ndarray::Array1;
use rand::{distributions::Distribution, rngs::StdRng, SeedableRng};
use statrs::distribution::Normal;

use crate::{
    inference::calc_covariance,
    movement::{
        core::{
            fixes::ObservationSet,
            options::CtcrwOptions,
            params::{CtcrwParams, ParamSpec},
        },
        errors::{CtcrwError, CtcrwResult},
        filter::{run_filter, FilterNode, NodeObs},
        smoother::{build_track, smooth, PointKind, PredictionGrid, Track},
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{maximize, Cost, LogLikelihood, OptimOutcome, Theta},
    },
};
use finitediff::FiniteDiff;
use nalgebra::Vector2;

/// Finite log-likelihood assigned to degenerate parameter trials.
///
/// Finite rather than `−∞` so line searches can still compare and back off.
pub const PENALTY_LOGLIK: f64 = -1.0e10;

/// Convergence tag of a fit attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    Converged,
    Failed,
}

/// Immutable outcome of an estimation run.
///
/// `covariance` is the free-parameter covariance on the working scale, from
/// the inverse observed information; it is always present when `status` is
/// [`FitStatus::Converged`] and always absent otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub status: FitStatus,
    pub params: CtcrwParams,
    pub theta_hat: Theta,
    pub loglik: f64,
    pub covariance: Option<ndarray::Array2<f64>>,
}

impl FitResult {
    pub fn is_converged(&self) -> bool {
        self.status == FitStatus::Converged
    }
}

/// CTCRW state-space model bound to a parameter specification.
///
/// After fitting, [`CtcrwModel::results`] caches the raw optimizer outcome
/// of the accepted attempt and [`CtcrwModel::fit_result`] the consolidated
/// [`FitResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct CtcrwModel {
    pub spec: ParamSpec,
    pub options: CtcrwOptions,
    pub results: Option<OptimOutcome>,
    pub fit_result: Option<FitResult>,
}

impl CtcrwModel {
    pub fn new(spec: ParamSpec, options: CtcrwOptions) -> Self {
        Self { spec, options, results: None, fit_result: None }
    }

    /// Build the filtering grid from the fixes plus optional extra times.
    ///
    /// `extra_times` must be sorted and deduplicated (as produced by
    /// [`PredictionGrid::times`]). An extra time exactly equal to an
    /// observation time is merged into the observation node; the
    /// observation wins.
    fn build_nodes(
        &self,
        data: &ObservationSet,
        extra_times: &[f64],
    ) -> CtcrwResult<(Vec<FilterNode>, Vec<PointKind>)> {
        let fixes = data.fixes();
        let mut nodes = Vec::with_capacity(fixes.len() + extra_times.len());
        let mut kinds = Vec::with_capacity(fixes.len() + extra_times.len());
        let mut grid = extra_times.iter().copied().peekable();

        for fix in fixes {
            while let Some(&t) = grid.peek() {
                if t < fix.time {
                    nodes.push(FilterNode { time: t, obs: None });
                    kinds.push(PointKind::Predicted);
                    grid.next();
                } else {
                    if t == fix.time {
                        grid.next();
                    }
                    break;
                }
            }
            let class_index = self.spec.class_index(&fix.class)?;
            nodes.push(FilterNode {
                time: fix.time,
                obs: Some(NodeObs { position: Vector2::new(fix.x, fix.y), class_index }),
            });
            kinds.push(PointKind::Observed);
        }
        for t in grid {
            nodes.push(FilterNode { time: t, obs: None });
            kinds.push(PointKind::Predicted);
        }
        Ok((nodes, kinds))
    }

    fn perturbed(base: &Theta, scale: f64, rng: &mut StdRng) -> CtcrwResult<Theta> {
        let noise = Normal::new(0.0, scale)
            .map_err(|e| CtcrwError::InvalidOptions { text: e.to_string() })?;
        Ok(base.mapv(|v| v + noise.sample(rng)))
    }

    /// Log-likelihood with the penalty absorption applied, as a plain
    /// `CtcrwResult`. Used by the warm start and the failure fallback.
    fn penalized_loglik(&self, theta: &Theta, data: &ObservationSet) -> CtcrwResult<f64> {
        self.value(theta, data).map_err(CtcrwError::from)
    }

    /// Fit the model by maximum likelihood and cache the result.
    ///
    /// ## Steps
    /// 1. Seed an RNG from `options.seed` and take the initial working
    ///    vector from the specification.
    /// 2. Warm start (optional): `warm_start_iters` Gaussian perturbations
    ///    of the incumbent working vector, best penalized likelihood wins.
    /// 3. Up to `1 + restarts` L-BFGS attempts; attempt 0 starts at the
    ///    warm-start incumbent, later attempts at perturbations of it.
    /// 4. An attempt is accepted when the solver converges and
    ///    [`calc_covariance`] succeeds on the observed information at its
    ///    optimum; otherwise the next attempt runs.
    /// 5. Budget exhausted: a [`FitStatus::Failed`] result is built from
    ///    the best attempt seen (no covariance) and returned, not an error.
    ///
    /// # Errors
    /// Configuration problems (unknown error classes, malformed grids)
    /// surface as errors; attempt-level numerical failures do not.
    pub fn fit(&mut self, data: &ObservationSet) -> CtcrwResult<FitResult> {
        // Fail on specification/data mismatches before any optimization.
        for fix in data.fixes() {
            self.spec.class_index(&fix.class)?;
        }

        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut incumbent = self.spec.initial_working();
        let mut incumbent_val = self.penalized_loglik(&incumbent, data)?;

        for _ in 0..self.options.warm_start_iters {
            let cand = Self::perturbed(&incumbent, self.options.warm_start_scale, &mut rng)?;
            let val = self.penalized_loglik(&cand, data)?;
            if val > incumbent_val {
                incumbent = cand;
                incumbent_val = val;
            }
        }

        let attempts = 1 + self.options.restarts;
        let mut best_failed: Option<OptimOutcome> = None;
        for attempt in 0..attempts {
            let start = if attempt == 0 {
                incumbent.clone()
            } else {
                Self::perturbed(&incumbent, self.options.restart_scale, &mut rng)?
            };
            let outcome = match maximize(&*self, start, data, &self.options.mle_opts) {
                Ok(outcome) => outcome,
                // A failed line search or solver breakdown burns the attempt.
                Err(_) => continue,
            };
            if !outcome.converged {
                if best_failed.as_ref().map(|b| outcome.value > b.value).unwrap_or(true) {
                    best_failed = Some(outcome);
                }
                continue;
            }

            let nll = |theta: &Array1<f64>| -> f64 {
                match self.value(theta, data) {
                    Ok(v) => -v,
                    Err(_) => f64::NAN,
                }
            };
            let grad_map = |theta: &Array1<f64>| theta.central_diff(&nll);
            match calc_covariance(&grad_map, &outcome.theta_hat) {
                Ok(cov) => {
                    let fit = FitResult {
                        status: FitStatus::Converged,
                        params: self.spec.params_from_working(&outcome.theta_hat)?,
                        theta_hat: outcome.theta_hat.clone(),
                        loglik: outcome.value,
                        covariance: Some(cov),
                    };
                    self.results = Some(outcome);
                    self.fit_result = Some(fit.clone());
                    return Ok(fit);
                }
                // Flat information at the optimum: the attempt failed the
                // convergence gate even though the solver terminated.
                Err(_) => {
                    if best_failed.as_ref().map(|b| outcome.value > b.value).unwrap_or(true) {
                        best_failed = Some(outcome);
                    }
                    continue;
                }
            }
        }

        let (theta_hat, loglik) = match &best_failed {
            Some(outcome) => (outcome.theta_hat.clone(), outcome.value),
            None => (incumbent, incumbent_val),
        };
        let fit = FitResult {
            status: FitStatus::Failed,
            params: self.spec.params_from_working(&theta_hat)?,
            theta_hat,
            loglik,
            covariance: None,
        };
        self.results = best_failed;
        self.fit_result = Some(fit.clone());
        Ok(fit)
    }

    /// Produce a smoothed track at the observation times, optionally
    /// augmented with a prediction grid.
    ///
    /// # Errors
    /// - [`CtcrwError::UnfitModel`] when no converged fit is available.
    /// - Grid validation and filtering/smoothing errors.
    pub fn predict(
        &self,
        data: &ObservationSet,
        grid: Option<&PredictionGrid>,
    ) -> CtcrwResult<Track> {
        let fit = self
            .fit_result
            .as_ref()
            .filter(|fit| fit.is_converged())
            .ok_or(CtcrwError::UnfitModel)?;
        let extra = match grid {
            Some(grid) => grid.times()?,
            None => Vec::new(),
        };
        let (nodes, kinds) = self.build_nodes(data, &extra)?;
        let pass = run_filter(&fit.params, &nodes)?;
        let smoothed = smooth(&pass)?;
        Ok(build_track(&nodes, &kinds, smoothed))
    }
}

impl LogLikelihood for CtcrwModel {
    type Data = ObservationSet;

    /// Exact Gaussian log-likelihood at working parameters `θ`.
    ///
    /// Degenerate trials (non-positive-definite innovation covariance) are
    /// mapped to [`PENALTY_LOGLIK`]; all other failures propagate.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost> {
        let params = self.spec.params_from_working(theta).map_err(OptError::from)?;
        let (nodes, _) = self.build_nodes(data, &[]).map_err(OptError::from)?;
        match run_filter(&params, &nodes) {
            Ok(pass) => Ok(pass.loglik),
            Err(CtcrwError::InnovationNotPositiveDefinite { .. }) => Ok(PENALTY_LOGLIK),
            Err(e) => Err(e.into()),
        }
    }

    /// Validate the working vector's length and finiteness, and that every
    /// fix's class has a role.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        if theta.len() != self.spec.free_len() {
            return Err(OptError::GradientDimMismatch {
                expected: self.spec.free_len(),
                found: theta.len(),
            });
        }
        if let Some((index, &value)) =
            theta.iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(OptError::InvalidThetaHat { index, value });
        }
        for fix in data.fixes() {
            self.spec.class_index(&fix.class).map_err(OptError::from)?;
        }
        Ok(())
    }
}
