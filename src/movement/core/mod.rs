//! movement::core — validated value types of the CTCRW model.
//!
//! Purpose
//! -------
//! Hold the small, validated building blocks the filter, estimator, and
//! predictor share: telemetry fixes, error-class roles, the parameter
//! specification with its working-space transform, the closed-form system
//! matrices, and estimation options. Each type validates its invariants at
//! construction so downstream code never re-checks them.

pub mod classes;
pub mod fixes;
pub mod matrices;
pub mod options;
pub mod params;

pub use self::classes::ErrorModel;
pub use self::fixes::{Fix, ObservationSet};
pub use self::options::CtcrwOptions;
pub use self::params::{CtcrwParams, ParamRole, ParamSpec, DEFAULT_POSITIVE_FLOOR};
