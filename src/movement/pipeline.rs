//! movement::pipeline — per-deployment staged runner.
//!
//! Purpose
//! -------
//! Bundle the artifacts of one deployment into an owned
//! [`DeploymentRecord`] and run the whole fit → predict → correct pipeline
//! with structured `(deployment, stage)` error context, so a batch driver
//! can keep going when one deployment fails. Deployments are independent;
//! the runner holds no shared state and can be called from any number of
//! concurrent workers.

use crate::{
    barrier::{
        errors::BarrierError,
        geometry::BarrierGeometry,
        router::{correct_track, RouterOptions},
    },
    movement::{
        core::{fixes::ObservationSet, options::CtcrwOptions, params::ParamSpec},
        errors::CtcrwError,
        models::{CtcrwModel, FitResult},
        smoother::{PredictionGrid, Track},
    },
};

/// Pipeline stage at which a deployment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fitting,
    Prediction,
    Correction,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fitting => write!(f, "fitting"),
            Stage::Prediction => write!(f, "prediction"),
            Stage::Correction => write!(f, "correction"),
        }
    }
}

/// Underlying cause of a pipeline failure.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineSource {
    Model(CtcrwError),
    Barrier(BarrierError),
}

impl std::fmt::Display for PipelineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineSource::Model(e) => write!(f, "{e}"),
            PipelineSource::Barrier(e) => write!(f, "{e}"),
        }
    }
}

/// A deployment failure with enough context for batch partial-failure
/// handling: which deployment, which stage, and the underlying cause.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineError {
    pub deployment: String,
    pub stage: Stage,
    pub source: PipelineSource,
}

impl std::error::Error for PipelineError {}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deployment '{}' failed during {}: {}", self.deployment, self.stage, self.source)
    }
}

/// Owned bundle of one deployment's pipeline artifacts.
///
/// `corrected` is present only when barrier correction was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRecord {
    pub id: String,
    pub fixes: ObservationSet,
    pub fit: FitResult,
    pub track: Track,
    pub corrected: Option<Track>,
}

/// Run the full pipeline for one deployment.
///
/// Stages: fit the CTCRW model, predict the smoothed track over the
/// observation times plus `grid`, and, when `barrier` is given, route the
/// track around the barrier geometry. A fit that exhausts its attempt
/// budget fails the deployment at the fitting stage with
/// [`CtcrwError::UnfitModel`]; downstream stages never see an unfit model.
pub fn run_deployment(
    id: impl Into<String>,
    fixes: ObservationSet,
    spec: ParamSpec,
    options: CtcrwOptions,
    grid: Option<&PredictionGrid>,
    barrier: Option<(&BarrierGeometry, &RouterOptions)>,
) -> Result<DeploymentRecord, PipelineError> {
    let id = id.into();
    let fail = |stage: Stage, source: PipelineSource, id: &str| PipelineError {
        deployment: id.to_string(),
        stage,
        source,
    };

    let mut model = CtcrwModel::new(spec, options);
    let fit = model
        .fit(&fixes)
        .map_err(|e| fail(Stage::Fitting, PipelineSource::Model(e), &id))?;
    if !fit.is_converged() {
        return Err(fail(Stage::Fitting, PipelineSource::Model(CtcrwError::UnfitModel), &id));
    }

    let track = model
        .predict(&fixes, grid)
        .map_err(|e| fail(Stage::Prediction, PipelineSource::Model(e), &id))?;

    let corrected = match barrier {
        Some((geometry, router_opts)) => Some(
            correct_track(&track, &fit, geometry, router_opts)
                .map_err(|e| fail(Stage::Correction, PipelineSource::Barrier(e), &id))?,
        ),
        None => None,
    };

    Ok(DeploymentRecord { id, fixes, fit, track, corrected })
}
