//! Numerically stable transforms shared by the optimization and movement
//! layers.

pub mod transformations;

pub use self::transformations::{
    safe_logistic, safe_logit, safe_softplus, safe_softplus_inv, EIGEN_EPS,
};
