//! movement::filter — Kalman forward pass and exact Gaussian log-likelihood.
//!
//! Purpose
//! -------
//! Run the discrete-time Kalman filter over an irregular time grid using the
//! closed-form CTCRW transition and process-noise matrices per elapsed Δt.
//! Each node of the grid either carries an observation (a telemetry fix with
//! its class index) or is a prediction-only time handled as a predict step
//! without an update. The pass accumulates the exact Gaussian
//! log-likelihood and retains the full predicted and filtered trajectory for
//! the smoother.
//!
//! Key behaviors
//! -------------
//! - Δt = 0 between consecutive nodes is a simultaneous update: identity
//!   transition, zero process-noise growth, no crash.
//! - A non-positive-definite innovation covariance raises
//!   [`CtcrwError::InnovationNotPositiveDefinite`]; the estimator treats it
//!   as a rejected trial, never as a crash.
//! - Initialization is diffuse: mean at the first observed position with
//!   zero velocity, position variance from that fix's class scale, velocity
//!   variance at the stationary value `σ²/(2β)`.
//!
//! Conventions
//! -----------
//! - State ordering `[x, y, vx, vy]`; all matrices are `nalgebra` fixed-size.
//! - Per-observation likelihood contribution:
//!   `−ln(2π) − ½ ln|S| − ½ rᵀS⁻¹r` with innovation `r` and innovation
//!   covariance `S = HPHᵀ + R`.
//! - The update uses the Joseph form, which preserves covariance symmetry.

use nalgebra::{Matrix4, Vector2, Vector4};

use crate::movement::{
    core::{
        matrices::{measurement_cov, observation, process_noise, stationary_velocity_var, transition},
        params::CtcrwParams,
    },
    errors::{CtcrwError, CtcrwResult},
};

/// Observation attached to a grid node: measured position plus the index of
/// its error class in the τ ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeObs {
    pub position: Vector2<f64>,
    pub class_index: usize,
}

/// One node of the filtering grid. Prediction-only times carry no
/// observation.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub time: f64,
    pub obs: Option<NodeObs>,
}

/// Full output of one forward pass.
///
/// Index `k` holds the state just before (`predicted_*`) and just after
/// (`filtered_*`) the update at node `k`; for prediction-only nodes the two
/// coincide. `transitions[k]` is the transition from node `k − 1` to node
/// `k`, with `transitions[0]` the identity.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPass {
    pub loglik: f64,
    pub predicted_means: Vec<Vector4<f64>>,
    pub predicted_covs: Vec<Matrix4<f64>>,
    pub filtered_means: Vec<Vector4<f64>>,
    pub filtered_covs: Vec<Matrix4<f64>>,
    pub transitions: Vec<Matrix4<f64>>,
}

/// Run the Kalman forward pass over `nodes` with the given parameters.
///
/// # Errors
/// - [`CtcrwError::EmptySeries`] when `nodes` is empty or carries no
///   observation at all (nothing to anchor the initial state).
/// - [`CtcrwError::NonMonotoneTime`] when node times decrease.
/// - [`CtcrwError::InnovationNotPositiveDefinite`] on a degenerate
///   innovation covariance.
pub fn run_filter(params: &CtcrwParams, nodes: &[FilterNode]) -> CtcrwResult<FilterPass> {
    let first_obs = nodes
        .iter()
        .find_map(|node| node.obs.as_ref())
        .ok_or(CtcrwError::EmptySeries)?;

    let n = nodes.len();
    let h = observation();
    let vvar = stationary_velocity_var(params.beta, params.sigma);
    let tau0 = params.tau(first_obs.class_index);

    let mut mean = Vector4::new(first_obs.position.x, first_obs.position.y, 0.0, 0.0);
    let mut cov = Matrix4::from_diagonal(&Vector4::new(tau0 * tau0, tau0 * tau0, vvar, vvar));

    let mut pass = FilterPass {
        loglik: 0.0,
        predicted_means: Vec::with_capacity(n),
        predicted_covs: Vec::with_capacity(n),
        filtered_means: Vec::with_capacity(n),
        filtered_covs: Vec::with_capacity(n),
        transitions: Vec::with_capacity(n),
    };

    for (k, node) in nodes.iter().enumerate() {
        let f = if k == 0 {
            Matrix4::identity()
        } else {
            let dt = node.time - nodes[k - 1].time;
            if dt < 0.0 {
                return Err(CtcrwError::NonMonotoneTime {
                    index: k,
                    prev: nodes[k - 1].time,
                    curr: node.time,
                });
            }
            let f = transition(params.beta, dt);
            let q = process_noise(params.beta, params.sigma, dt);
            mean = f * mean;
            cov = f * cov * f.transpose() + q;
            f
        };
        pass.transitions.push(f);
        pass.predicted_means.push(mean);
        pass.predicted_covs.push(cov);

        if let Some(obs) = &node.obs {
            let r_cov = measurement_cov(params.tau(obs.class_index));
            let innovation = obs.position - h * mean;
            let s = h * cov * h.transpose() + r_cov;
            let chol = s
                .cholesky()
                .ok_or(CtcrwError::InnovationNotPositiveDefinite { index: k })?;
            let s_inv = chol.inverse();
            let gain = cov * h.transpose() * s_inv;

            mean += gain * innovation;
            let i_kh = Matrix4::identity() - gain * h;
            cov = i_kh * cov * i_kh.transpose() + gain * r_cov * gain.transpose();

            let maha = (innovation.transpose() * s_inv * innovation)[(0, 0)];
            pass.loglik +=
                -(2.0 * std::f64::consts::PI).ln() - 0.5 * chol.determinant().ln() - 0.5 * maha;
        }
        pass.filtered_means.push(mean);
        pass.filtered_covs.push(cov);
    }
    Ok(pass)
}
