//! Least-squares and ridge solvers.
//!
//! We solve small regularized regression problems of the form:
//!
//! ```text
//! minimize ‖A w - b‖² + λ ‖w‖²
//! ```
//!
//! whose normal equations are `(AᵀA + λI) w = Aᵀb`.
//!
//! Implementation choices:
//! - `λ > 0`: the normal matrix is symmetric positive definite, so a Cholesky
//!   factorization is both cheap and stable. SVD is kept as a fallback for the
//!   rare case where rounding breaks positive definiteness.
//! - `λ = 0`: we solve the tall system `A w = b` directly by SVD (forming `AᵀA`
//!   squares the condition number). Rank must be checked by the caller.

use nalgebra::{DMatrix, DVector};

/// Relative singular-value cutoff used to decide numerical rank.
pub const RANK_RTOL: f64 = 1e-10;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    let eps = (s_max * RANK_RTOL).max(f64::MIN_POSITIVE);

    let beta = svd.solve(y, eps).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

/// Solve `(AᵀA + λI) w = Aᵀb`.
pub fn solve_ridge(a: &DMatrix<f64>, b: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    if lambda == 0.0 {
        return solve_least_squares(a, b);
    }

    let p = a.ncols();
    let at = a.transpose();
    let normal = &at * a + DMatrix::<f64>::identity(p, p) * lambda;
    let rhs = &at * b;

    if let Some(chol) = normal.clone().cholesky() {
        let w = chol.solve(&rhs);
        if w.iter().all(|v| v.is_finite()) {
            return Some(w);
        }
    }
    solve_least_squares(&normal, &rhs)
}

/// Numerical rank of `a`: singular values above `RANK_RTOL * σ_max * max(n, p)`.
pub fn numerical_rank(a: &DMatrix<f64>) -> usize {
    if a.is_empty() {
        return 0;
    }
    let sv = a.singular_values();
    let s_max = sv.max();
    if s_max <= 0.0 {
        return 0;
    }
    let tol = s_max * RANK_RTOL * a.nrows().max(a.ncols()) as f64;
    sv.iter().filter(|&&s| s > tol).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn ridge_matches_scalar_closed_form() {
        // One column: w = aᵀb / (aᵀa + λ)
        let a = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let b = DVector::from_row_slice(&[1.0, 1.0, 1.0]);
        let w = solve_ridge(&a, &b, 1.0).unwrap();
        assert!((w[0] - 6.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn rank_detects_duplicate_columns() {
        let full = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        assert_eq!(numerical_rank(&full), 2);

        let dup = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        assert_eq!(numerical_rank(&dup), 1);

        assert_eq!(numerical_rank(&DMatrix::<f64>::zeros(3, 2)), 0);
    }
}
