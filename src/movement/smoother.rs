//! movement::smoother — RTS fixed-interval smoothing and track types.
//!
//! Purpose
//! -------
//! Refine a completed forward filter pass with the Rauch-Tung-Striebel
//! backward recursion, producing smoothed means and covariances at every
//! retained time, and define the track types downstream consumers work
//! with: [`StateEstimate`], [`Track`], [`PointKind`], and the
//! [`PredictionGrid`] describing extra prediction times.
//!
//! Key behaviors
//! -------------
//! - Backward recursion: with predicted moments `(m⁻, P⁻)` and filtered
//!   moments `(m, P)`, the gain is `C_k = P_k F_{k+1}ᵀ (P⁻_{k+1})⁻¹` and
//!   smoothed moments follow the standard RTS update.
//! - At observation times the smoothed covariance never exceeds the
//!   filtered covariance (variance-reduction property, exercised in tests).
//! - Grid construction merges observation and prediction times; an exact
//!   time collision keeps the observation node only.

use nalgebra::{Matrix4, Vector2, Vector4};

use crate::movement::{
    errors::{CtcrwError, CtcrwResult},
    filter::{FilterNode, FilterPass},
};

/// Provenance of a track point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    /// The time of an original telemetry fix.
    Observed,
    /// An interpolated prediction-grid time.
    Predicted,
    /// A point moved or inserted by the barrier router.
    Rerouted,
}

/// Smoothed state at one instant: mean `[x, y, vx, vy]` and 4×4 covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEstimate {
    pub time: f64,
    pub mean: Vector4<f64>,
    pub cov: Matrix4<f64>,
    pub kind: PointKind,
}

impl StateEstimate {
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.mean[0], self.mean[1])
    }

    pub fn velocity(&self) -> Vector2<f64> {
        Vector2::new(self.mean[2], self.mean[3])
    }

    /// Instantaneous speed, the Euclidean norm of the velocity estimate.
    pub fn speed(&self) -> f64 {
        self.velocity().norm()
    }
}

/// An ordered sequence of state estimates for one deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub points: Vec<StateEstimate>,
}

impl Track {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Speeds at every track point, in track order.
    pub fn speeds(&self) -> Vec<f64> {
        self.points.iter().map(StateEstimate::speed).collect()
    }

    /// Total Euclidean length of the polyline through the point positions.
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].position() - w[0].position()).norm())
            .sum()
    }
}

/// Specification of additional prediction times.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionGrid {
    /// Explicit list of timestamps, in any order.
    Times(Vec<f64>),
    /// Regular grid `start, start + step, …` up to and including `end`.
    Interval { start: f64, end: f64, step: f64 },
}

impl PredictionGrid {
    /// Materialize the grid as a sorted, deduplicated time list.
    ///
    /// # Errors
    /// [`CtcrwError::InvalidGrid`] for non-finite entries, a non-positive
    /// step, or an interval with `end < start`.
    pub fn times(&self) -> CtcrwResult<Vec<f64>> {
        let mut times = match self {
            PredictionGrid::Times(list) => {
                if list.iter().any(|t| !t.is_finite()) {
                    return Err(CtcrwError::InvalidGrid { reason: "non-finite timestamp" });
                }
                list.clone()
            }
            PredictionGrid::Interval { start, end, step } => {
                if !start.is_finite() || !end.is_finite() || !step.is_finite() {
                    return Err(CtcrwError::InvalidGrid { reason: "non-finite interval" });
                }
                if *step <= 0.0 {
                    return Err(CtcrwError::InvalidGrid { reason: "step must be positive" });
                }
                if end < start {
                    return Err(CtcrwError::InvalidGrid { reason: "end precedes start" });
                }
                let count = ((end - start) / step).floor() as usize + 1;
                (0..count).map(|i| start + step * i as f64).collect()
            }
        };
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        times.dedup();
        Ok(times)
    }
}

/// Run the RTS backward recursion over a completed forward pass.
///
/// Returns smoothed `(mean, covariance)` pairs, one per node, in node
/// order.
///
/// # Errors
/// - [`CtcrwError::EmptySeries`] for a pass with no retained states.
/// - [`CtcrwError::SingularCovariance`] when a predicted covariance cannot
///   be inverted.
pub fn smooth(pass: &FilterPass) -> CtcrwResult<Vec<(Vector4<f64>, Matrix4<f64>)>> {
    let n = pass.filtered_means.len();
    if n == 0 {
        return Err(CtcrwError::EmptySeries);
    }
    let mut out = vec![(Vector4::zeros(), Matrix4::zeros()); n];
    out[n - 1] = (pass.filtered_means[n - 1], pass.filtered_covs[n - 1]);
    for k in (0..n - 1).rev() {
        let p_pred = pass.predicted_covs[k + 1];
        let p_pred_inv = p_pred
            .try_inverse()
            .ok_or(CtcrwError::SingularCovariance { index: k + 1 })?;
        let gain = pass.filtered_covs[k] * pass.transitions[k + 1].transpose() * p_pred_inv;

        let (next_mean, next_cov) = out[k + 1];
        let mean = pass.filtered_means[k] + gain * (next_mean - pass.predicted_means[k + 1]);
        let cov =
            pass.filtered_covs[k] + gain * (next_cov - p_pred) * gain.transpose();
        out[k] = (mean, cov);
    }
    Ok(out)
}

/// Assemble a [`Track`] from grid nodes, their kinds, and smoothed moments.
pub fn build_track(
    nodes: &[FilterNode],
    kinds: &[PointKind],
    smoothed: Vec<(Vector4<f64>, Matrix4<f64>)>,
) -> Track {
    let points = nodes
        .iter()
        .zip(kinds)
        .zip(smoothed)
        .map(|((node, &kind), (mean, cov))| StateEstimate { time: node.time, mean, cov, kind })
        .collect();
    Track { points }
}
