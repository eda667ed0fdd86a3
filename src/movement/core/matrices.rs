//! Closed-form CTCRW system matrices.
//!
//! State ordering is `[x, y, vx, vy]` with velocity following an
//! Ornstein-Uhlenbeck process `dv = −β v dt + σ dW` independently per
//! coordinate. For a step of length Δ, with `e = exp(−βΔ)` and
//! `φ = (1 − e)/β`, the per-coordinate blocks are
//!
//! ```text
//! F = [1  φ]        Q11 = (σ²/β²)(Δ − 2(1−e)/β + (1−e²)/(2β))
//!     [0  e]        Q12 = (σ²/(2β²))(1 − e)²
//!                   Q22 = (σ²/(2β))(1 − e²)
//! ```
//!
//! Δ = 0 yields `F = I`, `Q = 0`: a simultaneous update with no process
//! noise growth, never a crash.

use nalgebra::{Matrix2, Matrix2x4, Matrix4};

/// State transition matrix over a step of length `dt`.
pub fn transition(beta: f64, dt: f64) -> Matrix4<f64> {
    if dt == 0.0 {
        return Matrix4::identity();
    }
    let e = (-beta * dt).exp();
    let phi = (1.0 - e) / beta;
    #[rustfmt::skip]
    let f = Matrix4::new(
        1.0, 0.0, phi, 0.0,
        0.0, 1.0, 0.0, phi,
        0.0, 0.0, e,   0.0,
        0.0, 0.0, 0.0, e,
    );
    f
}

/// Process noise covariance accumulated over a step of length `dt`.
pub fn process_noise(beta: f64, sigma: f64, dt: f64) -> Matrix4<f64> {
    if dt == 0.0 {
        return Matrix4::zeros();
    }
    let e = (-beta * dt).exp();
    let s2 = sigma * sigma;
    let q11 = (s2 / (beta * beta)) * (dt - 2.0 * (1.0 - e) / beta + (1.0 - e * e) / (2.0 * beta));
    let q12 = (s2 / (2.0 * beta * beta)) * (1.0 - e) * (1.0 - e);
    let q22 = (s2 / (2.0 * beta)) * (1.0 - e * e);
    #[rustfmt::skip]
    let q = Matrix4::new(
        q11, 0.0, q12, 0.0,
        0.0, q11, 0.0, q12,
        q12, 0.0, q22, 0.0,
        0.0, q12, 0.0, q22,
    );
    q
}

/// Observation matrix selecting `(x, y)` from the state.
pub fn observation() -> Matrix2x4<f64> {
    #[rustfmt::skip]
    let h = Matrix2x4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
    );
    h
}

/// Isotropic measurement covariance `τ² I₂` for a class scale `tau`.
pub fn measurement_cov(tau: f64) -> Matrix2<f64> {
    Matrix2::identity() * (tau * tau)
}

/// Stationary variance of each velocity component, `σ²/(2β)`.
///
/// Used as the diffuse prior on velocity at filter initialization.
pub fn stationary_velocity_var(beta: f64, sigma: f64) -> f64 {
    sigma * sigma / (2.0 * beta)
}
