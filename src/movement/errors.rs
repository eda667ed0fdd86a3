use crate::optimization::errors::OptError;

/// Result alias for the movement layer.
pub type CtcrwResult<T> = Result<T, CtcrwError>;

/// Unified error type for the CTCRW movement stack.
///
/// Configuration problems (malformed fixes, roles, bounds, grids) are
/// surfaced before any filtering begins. Numerical problems inside a single
/// likelihood evaluation ([`CtcrwError::InnovationNotPositiveDefinite`]) are
/// absorbed by the estimator as rejected trials and never crash a fit.
#[derive(Debug, Clone, PartialEq)]
pub enum CtcrwError {
    // ---- Observation sequence ----
    /// An observation sequence must contain at least one fix.
    EmptySeries,

    /// Fix coordinates and timestamps must be finite.
    NonFiniteFix { index: usize },

    /// Fix timestamps must be strictly increasing within a deployment.
    NonMonotoneTime { index: usize, prev: f64, curr: f64 },

    // ---- Model specification ----
    /// A fix carries an error class with no entry in the error model.
    MissingErrorClass { class: String },

    /// At least one error-class scale must be fixed to anchor the model.
    NoAnchorClass,

    /// A box constraint with lower bound above its upper bound.
    InvalidBounds { name: String, lower: f64, upper: f64 },

    /// A fixed parameter value that is non-finite or outside its domain.
    InvalidFixedValue { name: String, value: f64 },

    /// A free parameter's initial value is non-finite or violates its bounds.
    InvalidInit { name: String, init: f64 },

    /// Estimation options failed validation.
    InvalidOptions { text: String },

    // ---- Filtering / smoothing ----
    /// The innovation covariance at a filter step is not positive definite.
    /// Signals a degenerate parameter trial, not a corrupt input.
    InnovationNotPositiveDefinite { index: usize },

    /// A predicted state covariance could not be inverted during smoothing.
    SingularCovariance { index: usize },

    // ---- Prediction ----
    /// A prediction grid with non-finite, unordered, or zero-step entries.
    InvalidGrid { reason: &'static str },

    /// Prediction was requested on a model whose fit did not converge.
    UnfitModel,

    // ---- Optimizer ----
    /// Error propagated from the optimization layer during fitting.
    Optimizer(OptError),
}

impl std::error::Error for CtcrwError {}

impl std::fmt::Display for CtcrwError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CtcrwError::EmptySeries => {
                write!(f, "observation sequence is empty")
            }
            CtcrwError::NonFiniteFix { index } => {
                write!(f, "fix {index} has a non-finite coordinate or timestamp")
            }
            CtcrwError::NonMonotoneTime { index, prev, curr } => {
                write!(
                    f,
                    "fix {index} breaks strict time ordering: {curr} follows {prev}"
                )
            }
            CtcrwError::MissingErrorClass { class } => {
                write!(f, "error class '{class}' has no entry in the error model")
            }
            CtcrwError::NoAnchorClass => {
                write!(
                    f,
                    "no fixed error-class scale: at least one class must anchor the model scale"
                )
            }
            CtcrwError::InvalidBounds { name, lower, upper } => {
                write!(f, "invalid bounds for '{name}': lower {lower} exceeds upper {upper}")
            }
            CtcrwError::InvalidFixedValue { name, value } => {
                write!(f, "invalid fixed value for '{name}': {value}")
            }
            CtcrwError::InvalidInit { name, init } => {
                write!(f, "invalid initial value for '{name}': {init}")
            }
            CtcrwError::InvalidOptions { text } => {
                write!(f, "invalid estimation options: {text}")
            }
            CtcrwError::InnovationNotPositiveDefinite { index } => {
                write!(
                    f,
                    "innovation covariance at step {index} is not positive definite"
                )
            }
            CtcrwError::SingularCovariance { index } => {
                write!(f, "predicted covariance at step {index} is singular")
            }
            CtcrwError::InvalidGrid { reason } => {
                write!(f, "invalid prediction grid: {reason}")
            }
            CtcrwError::UnfitModel => {
                write!(f, "model fit did not converge: prediction refused")
            }
            CtcrwError::Optimizer(err) => {
                write!(f, "optimizer error: {err}")
            }
        }
    }
}

impl From<OptError> for CtcrwError {
    fn from(err: OptError) -> Self {
        CtcrwError::Optimizer(err)
    }
}

impl From<CtcrwError> for OptError {
    fn from(err: CtcrwError) -> Self {
        match err {
            CtcrwError::Optimizer(inner) => inner,
            other => OptError::ModelError { text: other.to_string() },
        }
    }
}
