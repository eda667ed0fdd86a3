//! movement::models — model types wiring the CTCRW domain to the optimizer.

pub mod ctcrw;

pub use self::ctcrw::{CtcrwModel, FitResult, FitStatus, PENALTY_LOGLIK};
