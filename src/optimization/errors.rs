use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

/// Unified error type for the optimization layer.
///
/// Covers configuration problems (tolerances, line search, L-BFGS memory),
/// derivative validation failures, argmin backend errors, and model errors
/// surfaced through [`super::loglik_optimizer::LogLikelihood`] evaluations.
#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Signals that the model has no analytic gradient; finite differences
    /// are used instead.
    GradientNotImplemented,

    /// Gradient length does not match the parameter dimension.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient entries must be finite.
    InvalidGradient { index: usize, value: f64 },

    // ---- Options ----
    /// Gradient-norm tolerance must be finite and strictly positive.
    InvalidTolGrad { tol: f64, reason: &'static str },

    /// Cost-change tolerance must be finite and strictly positive.
    InvalidTolCost { tol: f64, reason: &'static str },

    /// Maximum iterations must be greater than zero.
    InvalidMaxIter { max_iter: usize },

    /// At least one stopping rule must be provided.
    NoTolerancesProvided,

    /// L-BFGS history size must be at least one.
    InvalidLbfgsMem { mem: usize },

    // ---- Cost function ----
    /// The cost function produced a non-finite value.
    NonFiniteCost { value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be present and finite.
    InvalidThetaHat { index: usize, value: f64 },

    /// The solver terminated without a best parameter vector.
    MissingThetaHat,

    // ---- Hessian / information ----
    /// Hessian dimensions do not match the parameter dimension.
    HessianDimMismatch { expected: usize, found: (usize, usize) },

    /// Hessian entries must be finite.
    InvalidHessian { row: usize, col: usize, value: f64 },

    /// Observed information is singular at the optimum; no parameter
    /// covariance can be computed. Treated as a failed fit attempt.
    NonInvertibleInformation { min_eigenvalue: f64 },

    // ---- Model ----
    /// Error raised by a model's log-likelihood implementation.
    ModelError { text: String },

    // ---- Argmin ----
    /// Wrapper for argmin's typed errors.
    InvalidParameter { text: String },
    NotInitialized { text: String },
    ConditionViolated { text: String },
    PotentialBug { text: String },

    /// Wrapper for any other argmin error.
    BackendError { text: String },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::GradientNotImplemented => {
                write!(f, "analytic gradient not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value } => {
                write!(f, "non-finite gradient entry at index {index}: {value}")
            }
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "invalid cost tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter } => {
                write!(f, "invalid maximum iterations {max_iter}: must be greater than zero")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "no stopping rule provided: set tol_grad, tol_cost, or max_iter")
            }
            OptError::InvalidLbfgsMem { mem } => {
                write!(f, "invalid L-BFGS memory {mem}: must be at least one")
            }
            OptError::NonFiniteCost { value } => {
                write!(f, "cost function returned a non-finite value: {value}")
            }
            OptError::InvalidThetaHat { index, value } => {
                write!(f, "non-finite estimate at index {index}: {value}")
            }
            OptError::MissingThetaHat => {
                write!(f, "solver terminated without a best parameter vector")
            }
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "non-finite Hessian entry at ({row}, {col}): {value}")
            }
            OptError::NonInvertibleInformation { min_eigenvalue } => {
                write!(
                    f,
                    "observed information is singular (smallest eigenvalue {min_eigenvalue:e}); \
                     parameter covariance unavailable"
                )
            }
            OptError::ModelError { text } => {
                write!(f, "model error: {text}")
            }
            OptError::InvalidParameter { text } => {
                write!(f, "invalid parameter: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "condition violated: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "potential bug: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "backend error: {text}")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original: Error) -> Self {
        match original.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                other => OptError::BackendError { text: format!("{other}") },
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}
