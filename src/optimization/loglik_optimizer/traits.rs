//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait implemented by model types.
//! - [`MLEOptions`] and [`Tolerances`]: optimizer configuration.
//! - [`LineSearcher`]: line search used inside L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by `maximize`.
//!
//! Convention: we *maximize* a log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = −ℓ(θ)`. An analytic gradient, if provided, is the gradient of the
//! log-likelihood; the adapter flips signs as needed.

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        types::{Cost, FnEvalMap, Grad, Theta},
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Model-implemented log-likelihood interface.
///
/// `value` evaluates `ℓ(θ)` for a working-space parameter vector; `check` is
/// a validation hook called once before optimization starts to reject
/// obviously invalid `θ`/data pairs. Models without an analytic gradient
/// leave `grad` unimplemented and the adapter falls back to robust finite
/// differences of the cost.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parses case-insensitively from `"MoreThuente"` or `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidParameter {
                text: format!("unknown line searcher '{s}': use 'MoreThuente' or 'HagerZhang'"),
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// `tols` holds the stopping rules, `line_searcher` selects the L-BFGS line
/// search, `verbose` attaches a terminal observer when the `obs_slog`
/// feature is enabled, and `lbfgs_mem` overrides the default history size.
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Create a validated set of optimizer options.
    pub fn new(
        tols: Tolerances,
        line_searcher: LineSearcher,
        verbose: bool,
        lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(mem) = lbfgs_mem {
            if mem == 0 {
                return Err(OptError::InvalidLbfgsMem { mem });
            }
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::new(Some(1e-6), None, Some(300)).unwrap(),
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// Any field can be `None`, but at least one of the three must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>,
        tol_cost: Option<f64>,
        max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter { max_iter });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best working-space parameter vector found.
/// - `value`: best **log-likelihood** `ℓ(θ̂)` (not the cost).
/// - `converged`: `true` when the solver reported any terminating status
///   other than `NotTerminated`.
/// - `status`: human-readable termination status.
/// - `iterations`, `fn_evals`: solver diagnostics.
/// - `grad_norm`: norm of the last available gradient, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// Propagates validation errors for `theta_hat` (present, finite) and
    /// `value` (finite).
    pub fn new(
        theta_hat: Option<Theta>,
        value: f64,
        termination: TerminationStatus,
        iterations: u64,
        fn_evals: FnEvalMap,
        grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.l2_norm()),
        })
    }
}
