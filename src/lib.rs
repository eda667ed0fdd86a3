//! ctcrw — continuous-time correlated random walk estimation for telemetry.
//!
//! Purpose
//! -------
//! Fit a continuous-time correlated random walk (CTCRW) state-space model to
//! irregularly spaced, error-prone position fixes, produce smoothed tracks at
//! observation and prediction times, and correct predicted paths that cross
//! barrier geometry (land). The crate is a pure per-deployment computation
//! library: it performs no I/O, holds no global state, and is safe to call
//! from any number of concurrent workers, one deployment per call.
//!
//! Key behaviors
//! -------------
//! - Validate raw fixes into an [`movement::ObservationSet`] and map per-fix
//!   quality classes to measurement-error scales via [`movement::ErrorModel`].
//! - Evaluate the exact Gaussian log-likelihood with a Kalman filter over
//!   closed-form CTCRW transition/noise matrices (`movement::filter`).
//! - Estimate free parameters by L-BFGS maximum likelihood
//!   (`optimization::loglik_optimizer`) with optional stochastic warm start
//!   and restart attempts, gated on an invertible observed-information
//!   matrix (`inference`).
//! - Produce smoothed state estimates at observation and prediction times
//!   via an RTS fixed-interval smoother (`movement::smoother`).
//! - Re-route track segments that intersect barrier polygons along the
//!   barrier boundary (`barrier::router`), reporting anything it cannot
//!   resolve within its pass budget.
//!
//! Conventions
//! -----------
//! - Times are monotone `f64` values in a caller-chosen unit (typically
//!   seconds); positions are planar projected coordinates.
//! - Optimizer parameters live in an unconstrained working space; the
//!   movement layer owns the mapping to natural `(β, σ, τ…)` parameters.
//! - Fallible operations return layer-specific `Result` aliases; the crate
//!   never panics on invalid input and uses no `unsafe`.
//!
//! Downstream usage
//! ----------------
//! - Upstream glue (archive unpacking, CSV parsing, deduplication, speed
//!   filtering) supplies clean fixes and barrier polygons; downstream glue
//!   consumes [`movement::Track`] and [`movement::FitResult`] for conversion
//!   to geometry or plots. Neither side is part of this crate.
//! - Batch callers process deployments independently; see
//!   [`movement::pipeline`] for the per-deployment record bundle and staged
//!   error context.

pub mod barrier;
pub mod inference;
pub mod movement;
pub mod optimization;
