//! L-BFGS solver construction helpers.
//!
//! Small builders that hide argmin's generic wiring: pick a line search,
//! apply the crate-level tolerances from [`MLEOptions`], and hand back a
//! configured solver. Initial parameters and iteration limits are runtime
//! concerns applied by the runner, not here.

use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta,
            DEFAULT_LBFGS_MEM,
        },
    },
};

/// Construct an L-BFGS solver with Hager–Zhang line search.
///
/// Uses `opts.lbfgs_mem` for the history size when present, otherwise
/// [`DEFAULT_LBFGS_MEM`], and applies any configured tolerances.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// Construct an L-BFGS solver with More–Thuente line search.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply optional gradient and cost tolerances to an L-BFGS solver.
///
/// When a tolerance is `None`, the corresponding `with_tolerance_*` call is
/// skipped and argmin's default remains in effect.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>,
    opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::traits::{LineSearcher, Tolerances};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Solver construction with default and explicit L-BFGS memory.
    // - Tolerance application through configure_lbfgs.
    // -------------------------------------------------------------------------

    fn opts(lbfgs_mem: Option<usize>, searcher: LineSearcher) -> MLEOptions {
        let tols = Tolerances::new(Some(1e-6), Some(1e-9), Some(100)).unwrap();
        MLEOptions::new(tols, searcher, false, lbfgs_mem).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Both builders succeed with default memory and valid tolerances.
    fn builders_succeed_with_default_memory() {
        assert!(build_optimizer_hager_zhang(&opts(None, LineSearcher::HagerZhang)).is_ok());
        assert!(build_optimizer_more_thuente(&opts(None, LineSearcher::MoreThuente)).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // An explicit history size is accepted by both builders.
    fn builders_accept_explicit_memory() {
        assert!(build_optimizer_hager_zhang(&opts(Some(11), LineSearcher::HagerZhang)).is_ok());
        assert!(build_optimizer_more_thuente(&opts(Some(3), LineSearcher::MoreThuente)).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // configure_lbfgs succeeds when both tolerances are absent, relying on
    // argmin defaults.
    fn configure_lbfgs_accepts_absent_tolerances() {
        let raw = LbfgsMoreThuente::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
        let tols = Tolerances::new(None, None, Some(10)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None).unwrap();
        assert!(configure_lbfgs(raw, &opts).is_ok());
    }
}
