//! movement — continuous-time correlated random walk estimation.
//!
//! Purpose
//! -------
//! Fit a CTCRW state-space model to irregularly-spaced, error-prone
//! telemetry fixes and produce smoothed tracks with uncertainties. The
//! state is `[x, y, vx, vy]` with velocity following an
//! Ornstein-Uhlenbeck process; observations are positions with
//! class-dependent isotropic noise.
//!
//! Key behaviors
//! -------------
//! - `core` holds the validated value types: fixes, error-class roles, the
//!   parameter specification with its working-space transform, closed-form
//!   system matrices, and estimation options.
//! - `filter` runs the Kalman forward pass and the exact Gaussian
//!   log-likelihood over the irregular grid.
//! - `smoother` refines the forward pass with the RTS backward recursion
//!   and defines the track types.
//! - `models::ctcrw` wires the domain into the optimizer: likelihood
//!   evaluation with penalty absorption, the restart/warm-start estimator
//!   with its covariance convergence gate, and prediction.
//! - `pipeline` runs one deployment end to end with structured error
//!   context.
//!
//! Conventions
//! -----------
//! - Configuration problems fail before any filtering; per-trial numerical
//!   problems are absorbed by the estimator; a failed fit is a value
//!   ([`models::FitStatus::Failed`]), not an error, and prediction refuses
//!   it explicitly.
//! - All types are plain owned data; deployments are independent and the
//!   module holds no global state.
//!
//! Downstream usage
//! ----------------
//! - Callers assemble an [`core::ObservationSet`] and a
//!   [`core::ParamSpec`], then either drive [`models::CtcrwModel`]
//!   directly or use [`pipeline::run_deployment`] for the staged flow.

pub mod core;
pub mod errors;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod smoother;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::core::{CtcrwOptions, CtcrwParams, ErrorModel, Fix, ObservationSet, ParamRole, ParamSpec};
pub use self::errors::{CtcrwError, CtcrwResult};
pub use self::models::{CtcrwModel, FitResult, FitStatus};
pub use self::smoother::{PointKind, PredictionGrid, StateEstimate, Track};

// ---- Optional convenience prelude for downstream crates ------------------

pub mod prelude {
    pub use super::core::{
        CtcrwOptions, CtcrwParams, ErrorModel, Fix, ObservationSet, ParamRole, ParamSpec,
    };
    pub use super::errors::{CtcrwError, CtcrwResult};
    pub use super::models::{CtcrwModel, FitResult, FitStatus};
    pub use super::pipeline::{run_deployment, DeploymentRecord, PipelineError, Stage};
    pub use super::smoother::{PointKind, PredictionGrid, StateEstimate, Track};
}
