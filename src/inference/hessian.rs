//! inference::hessian — observed-information covariance estimates.
//!
//! Purpose
//! -------
//! Convert finite-difference Hessians of the negative log-likelihood into a
//! covariance matrix for the estimated parameters. Handles conversion
//! between `ndarray` and `nalgebra` types and uses symmetric
//! eigendecomposition rather than explicit matrix inversion.
//!
//! Key behaviors
//! -------------
//! - Call [`compute_hessian`] on a gradient map to obtain the observed
//!   information matrix `J(θ̂)`.
//! - Copy the `ndarray` Hessian into a `nalgebra::DMatrix`
//!   (`fill_dmatrix`) for eigen-based linear algebra.
//! - Invert through the eigendecomposition `J = Q Λ Qᵀ`, i.e.
//!   `Cov = Q Λ⁻¹ Qᵀ`.
//! - Reject information matrices whose smallest eigenvalue is at or below
//!   [`EIGEN_EPS`]: a flat or indefinite curvature means the optimizer did
//!   not land on a proper interior maximum, and no covariance is reported.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`compute_hessian`] returns a finite, square, symmetrized `p×p`
//!   matrix with `p = θ̂.len()`; this module does not re-symmetrize.
//! - The gradient map is that of the **negative** log-likelihood, so the
//!   Hessian at a proper maximum of `ℓ` is positive definite.
//!
//! Downstream usage
//! ----------------
//! - The movement model calls [`calc_covariance`] after fitting; a
//!   [`OptError::NonInvertibleInformation`] result downgrades the fit
//!   status instead of aborting the pipeline.

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::finite_diff::compute_hessian,
    numerical_stability::transformations::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// calc_covariance — covariance of `θ̂` from observed information.
///
/// Purpose
/// -------
/// Compute `Cov(θ̂) = J(θ̂)⁻¹` where `J` is the finite-difference Hessian of
/// the negative log-likelihood gradient map `f` at `theta_hat`. The inverse
/// is formed through symmetric eigendecomposition so that near-singular
/// information is detected explicitly instead of producing garbage
/// variances.
///
/// Parameters
/// ----------
/// - `f`: gradient map of the negative log-likelihood, `θ ↦ ∇(−ℓ)(θ)`.
///   Must be C¹ in a neighborhood of `theta_hat`.
/// - `theta_hat`: estimate `θ̂` at which the information is evaluated; its
///   length `p` fixes the covariance dimension.
///
/// Returns
/// -------
/// `OptResult<Array2<f64>>`: a symmetric `p×p` covariance matrix on the
/// working-parameter scale.
///
/// Errors
/// ------
/// - Propagates [`compute_hessian`] failures (non-finite entries, shape
///   mismatches).
/// - [`OptError::NonInvertibleInformation`] when the smallest eigenvalue of
///   `J(θ̂)` is at or below [`EIGEN_EPS`]. Callers should treat this as a
///   sign the optimum is flat or on a boundary, not as a crash.
pub fn calc_covariance<F: Fn(&Array1<f64>) -> Array1<f64>>(
    f: &F,
    theta_hat: &Array1<f64>,
) -> OptResult<Array2<f64>> {
    let p = theta_hat.len();
    let obs_info = compute_hessian(f, theta_hat)?;
    let mut obs_info_nalg = DMatrix::<f64>::zeros(obs_info.nrows(), obs_info.ncols());
    fill_dmatrix(&obs_info, &mut obs_info_nalg);
    invert_information(obs_info_nalg, p)
}

// ---- Helper methods ----

/// Copy an `ndarray` Hessian into a `nalgebra::DMatrix` column by column.
///
/// No symmetrization is performed; any asymmetry present in `obs_info` is
/// preserved. Shape mismatches are programmer errors and will panic via
/// out-of-bounds indexing.
fn fill_dmatrix(obs_info: &Array2<f64>, obs_info_nalg: &mut DMatrix<f64>) {
    let n = obs_info.ncols();
    for j in 0..n {
        for i in j..n {
            if j == i {
                obs_info_nalg[(i, i)] = obs_info[[i, i]];
            } else {
                obs_info_nalg[(i, j)] = obs_info[[i, j]];
                obs_info_nalg[(j, i)] = obs_info[[j, i]];
            }
        }
    }
}

/// Invert a symmetric information matrix through its eigendecomposition.
///
/// With `J = Q Λ Qᵀ`, the covariance is `Q Λ⁻¹ Qᵀ`, assembled entrywise as
/// `Cov[i,j] = Σ_k Q[i,k] Q[j,k] / λ_k`. If any `λ_k ≤ EIGEN_EPS` the
/// matrix is declared non-invertible and the smallest eigenvalue is
/// reported in the error.
fn invert_information(obs_info_nalg: DMatrix<f64>, p: usize) -> OptResult<Array2<f64>> {
    let eigen_decomp = obs_info_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;

    let min_eigenvalue = eigenvals.iter().cloned().fold(f64::INFINITY, f64::min);
    if min_eigenvalue <= EIGEN_EPS {
        return Err(OptError::NonInvertibleInformation { min_eigenvalue });
    }

    let mut cov = Array2::<f64>::zeros((p, p));
    for i in 0..p {
        for j in 0..=i {
            let entry: f64 = (0..p).map(|k| q[(i, k)] * q[(j, k)] / eigenvals[k]).sum();
            cov[[i, j]] = entry;
            cov[[j, i]] = entry;
        }
    }
    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Correct copying of Hessians from `ndarray` into `DMatrix`.
    // - Covariance recovery for quadratics with known analytic information.
    // - Rejection of flat (rank-deficient) information matrices.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `fill_dmatrix` copies entries without altering values or
    // symmetry.
    //
    // Given
    // -----
    // - A small 2×2 symmetric `Array2<f64>` with distinct entries.
    //
    // Expect
    // ------
    // - The corresponding `DMatrix` has identical entries at all positions.
    fn fill_dmatrix_copies_ndarray_into_dmatrix_without_modification() {
        // Arrange
        let obs_info: Array2<f64> = array![[2.0, 0.5], [0.5, 1.0]];
        let mut obs_info_nalg = DMatrix::<f64>::zeros(2, 2);

        // Act
        fill_dmatrix(&obs_info, &mut obs_info_nalg);

        // Assert
        assert_eq!(obs_info_nalg[(0, 0)], 2.0);
        assert_eq!(obs_info_nalg[(0, 1)], 0.5);
        assert_eq!(obs_info_nalg[(1, 0)], 0.5);
        assert_eq!(obs_info_nalg[(1, 1)], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Check that `calc_covariance` inverts a diagonal information matrix.
    //
    // Given
    // -----
    // - A diagonal information matrix A = diag(4, 1) encoded via the linear
    //   gradient map g(θ) = A θ.
    //
    // Expect
    // ------
    // - Cov ≈ diag(1/4, 1) with vanishing off-diagonals.
    fn calc_covariance_diagonal_quadratic_matches_analytic_inverse() {
        // Arrange
        let a = array![[4.0, 0.0], [0.0, 1.0]];
        let f = |theta: &Array1<f64>| -> Array1<f64> { a.dot(theta) };
        let theta_hat = array![1.0, -1.0];

        // Act
        let cov = calc_covariance(&f, &theta_hat).unwrap();

        // Assert
        assert_eq!(cov.shape(), &[2, 2]);
        assert!((cov[[0, 0]] - 0.25).abs() < 1e-6);
        assert!((cov[[1, 1]] - 1.0).abs() < 1e-6);
        assert!(cov[[0, 1]].abs() < 1e-6);
        assert!(cov[[1, 0]].abs() < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // A correlated quadratic produces the analytic 2×2 inverse.
    //
    // Given
    // -----
    // - A = [[2, 1], [1, 2]] with inverse (1/3)·[[2, −1], [−1, 2]].
    //
    // Expect
    // ------
    // - Entries agree with the analytic inverse to FD accuracy.
    fn calc_covariance_correlated_quadratic_matches_analytic_inverse() {
        // Arrange
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        let f = |theta: &Array1<f64>| -> Array1<f64> { a.dot(theta) };
        let theta_hat = array![0.3, -0.7];

        // Act
        let cov = calc_covariance(&f, &theta_hat).unwrap();

        // Assert
        assert!((cov[[0, 0]] - 2.0 / 3.0).abs() < 1e-5);
        assert!((cov[[1, 1]] - 2.0 / 3.0).abs() < 1e-5);
        assert!((cov[[0, 1]] + 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // A rank-deficient information matrix is rejected rather than inverted.
    //
    // Given
    // -----
    // - The gradient map of a flat direction: g(θ) = (θ₀, 0), whose Hessian
    //   is diag(1, 0).
    //
    // Expect
    // ------
    // - `NonInvertibleInformation` carrying a near-zero smallest eigenvalue.
    fn calc_covariance_rejects_rank_deficient_information() {
        // Arrange
        let f = |theta: &Array1<f64>| -> Array1<f64> { array![theta[0], 0.0] };
        let theta_hat = array![1.0, 1.0];

        // Act
        let err = calc_covariance(&f, &theta_hat).unwrap_err();

        // Assert
        match err {
            OptError::NonInvertibleInformation { min_eigenvalue } => {
                assert!(min_eigenvalue.abs() < 1e-4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // `invert_information` agrees with a direct nalgebra inverse on a
    // well-conditioned matrix.
    fn invert_information_matches_direct_inverse() {
        // Arrange
        let j = DMatrix::<f64>::from_diagonal(&DVector::from_vec(vec![5.0, 0.5]));

        // Act
        let cov = invert_information(j, 2).unwrap();

        // Assert
        assert!((cov[[0, 0]] - 0.2).abs() < 1e-12);
        assert!((cov[[1, 1]] - 2.0).abs() < 1e-12);
    }
}
