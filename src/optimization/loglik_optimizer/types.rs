//! Shared numeric aliases and solver wiring for the optimizer.
//!
//! Centralizing these keeps the rest of the optimization code agnostic to
//! `ndarray` and argmin generics.

use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ` in unconstrained working space.
pub type Theta = Array1<f64>;

/// Gradient vector matching the shape of [`Theta`].
pub type Grad = Array1<f64>;

/// Dense Hessian matrix, `n × n` for `n = theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value; internally the cost `c(θ) = −ℓ(θ)`.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Hager–Zhang line search specialized to this crate's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
