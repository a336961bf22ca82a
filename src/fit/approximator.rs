//! Regularized approximation of a target payoff by a basis of option payoffs.
//!
//! Given:
//! - target samples `b_i` on a price grid
//! - basis columns `A_ij` sampled on the same grid
//! - a penalty kind and strength `λ`
//!
//! we solve for the basket weights `w` and derive the reconstruction `A w`.
//!
//! | method   | objective                                   | solver                 |
//! |----------|---------------------------------------------|------------------------|
//! | L2       | `‖A w - b‖² + λ ‖w‖²`                       | normal equations / SVD |
//! | L1       | `(1/2n) ‖A w - b‖² + λ ‖w‖₁`                | dual active set        |
//! | Weighted | `Σ |b_i| · |(A w - b)_i| + λ ‖w‖₁`          | IRLS                   |

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::domain::{BasisSet, FitMethod, FitReport, PenaltyKind, TargetPayoff, Weights};
use crate::error::FitError;
use crate::math::{
    IrlsOptions, LassoOptions, kkt_violation, numerical_rank, solve_lasso, solve_ridge,
    solve_weighted_l1,
};
use crate::models::matvec;

/// Solver knobs for the iterative methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitOptions {
    pub lasso: LassoOptions,
    pub irls: IrlsOptions,
}

/// Fit `basis` to `target` under an L1 or L2 penalty and return the weights.
pub fn fit(
    target: &TargetPayoff,
    basis: &BasisSet,
    penalty_kind: PenaltyKind,
    penalty_strength: f64,
) -> Result<Weights, FitError> {
    let method = match penalty_kind {
        PenaltyKind::L1 => FitMethod::L1,
        PenaltyKind::L2 => FitMethod::L2,
    };
    fit_with_method(target, basis, method, penalty_strength, &FitOptions::default())
        .map(|report| report.weights)
}

/// Weighted-error fit: `Σ |b_i| · |(A w - b)_i| + γ ‖w‖₁`.
pub fn fit_weighted(
    target: &TargetPayoff,
    basis: &BasisSet,
    gamma: f64,
) -> Result<FitReport, FitError> {
    fit_with_method(target, basis, FitMethod::Weighted, gamma, &FitOptions::default())
}

/// Run one method and return weights, reconstruction, and diagnostics.
pub fn fit_with_method(
    target: &TargetPayoff,
    basis: &BasisSet,
    method: FitMethod,
    penalty_strength: f64,
    opts: &FitOptions,
) -> Result<FitReport, FitError> {
    validate(target, basis, penalty_strength)?;

    let a = basis.design_matrix();
    let b = DVector::from_column_slice(&target.values);

    if penalty_strength == 0.0 {
        let rank = numerical_rank(&a);
        if rank < a.ncols() {
            return Err(FitError::DegenerateBasis {
                rank,
                columns: a.ncols(),
            });
        }
    }

    let (w, iterations, converged) = match method {
        FitMethod::L2 => {
            let w = solve_ridge(&a, &b, penalty_strength).ok_or_else(|| degenerate(&a))?;
            (w, 1, true)
        }
        FitMethod::L1 => {
            let sol = solve_lasso(&a, &b, penalty_strength, &opts.lasso);
            if sol.converged {
                debug!(
                    kkt = kkt_violation(&a, &b, &sol.w, penalty_strength),
                    "lasso optimality residual"
                );
            } else {
                warn!(
                    iterations = sol.iterations,
                    lambda = penalty_strength,
                    "lasso active set hit the step cap; returning last iterate"
                );
            }
            (sol.w, sol.iterations, sol.converged)
        }
        FitMethod::Weighted => {
            let w0 = solve_ridge(&a, &b, penalty_strength).ok_or_else(|| degenerate(&a))?;
            let c = b.map(f64::abs);
            let sol = solve_weighted_l1(&a, &b, &c, penalty_strength, w0, &opts.irls);
            if !sol.converged {
                warn!(
                    iterations = sol.iterations,
                    gamma = penalty_strength,
                    "weighted-error IRLS did not reach tolerance; returning best iterate"
                );
            }
            (sol.w, sol.iterations, sol.converged)
        }
    };

    let report = build_report(
        &a,
        target,
        basis,
        method,
        penalty_strength,
        w,
        iterations,
        converged,
    );
    debug!(
        method = method.key(),
        lambda = penalty_strength,
        rmse = report.rmse,
        nonzero = report.weights.nonzero_count(),
        iterations,
        "fit complete"
    );
    Ok(report)
}

fn degenerate(a: &DMatrix<f64>) -> FitError {
    FitError::DegenerateBasis {
        rank: numerical_rank(a),
        columns: a.ncols(),
    }
}

fn validate(
    target: &TargetPayoff,
    basis: &BasisSet,
    penalty_strength: f64,
) -> Result<(), FitError> {
    if !(penalty_strength.is_finite() && penalty_strength >= 0.0) {
        return Err(FitError::invalid(format!(
            "Penalty strength must be finite and >= 0, got {penalty_strength}."
        )));
    }
    if basis.is_empty() {
        return Err(FitError::invalid("Basis set is empty."));
    }

    let n = target.len();
    if target.grid.len() != n {
        return Err(FitError::DimensionMismatch {
            name: "target".to_string(),
            expected: target.grid.len(),
            found: n,
        });
    }
    for f in &basis.functions {
        if f.values.len() != n {
            return Err(FitError::DimensionMismatch {
                name: f.name.clone(),
                expected: n,
                found: f.values.len(),
            });
        }
    }
    if basis.grid.len() != n {
        return Err(FitError::DimensionMismatch {
            name: "basis grid".to_string(),
            expected: n,
            found: basis.grid.len(),
        });
    }
    for (index, (&t, &s)) in target
        .grid
        .points()
        .iter()
        .zip(basis.grid.points())
        .enumerate()
    {
        if t != s {
            return Err(FitError::GridMismatch {
                index,
                expected: t,
                found: s,
            });
        }
    }

    if target.values.iter().any(|v| !v.is_finite()) {
        return Err(FitError::invalid("Target contains non-finite values."));
    }
    if let Some(f) = basis
        .functions
        .iter()
        .find(|f| f.values.iter().any(|v| !v.is_finite()))
    {
        return Err(FitError::invalid(format!(
            "Basis column '{}' contains non-finite values.",
            f.name
        )));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_report(
    a: &DMatrix<f64>,
    target: &TargetPayoff,
    basis: &BasisSet,
    method: FitMethod,
    penalty_strength: f64,
    w: DVector<f64>,
    iterations: usize,
    converged: bool,
) -> FitReport {
    let reconstruction = matvec(a, &w);

    let n = reconstruction.len().max(1) as f64;
    let mut sse = 0.0;
    let mut max_abs_error = 0.0_f64;
    for (y_fit, y) in reconstruction.iter().zip(&target.values) {
        let r = y - y_fit;
        sse += r * r;
        max_abs_error = max_abs_error.max(r.abs());
    }

    FitReport {
        method,
        penalty_strength,
        weights: Weights::new(basis.names(), w.iter().copied().collect()),
        reconstruction,
        rmse: (sse / n).sqrt(),
        max_abs_error,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Grid;

    fn calls(grid: &Grid, strikes: &[f64]) -> BasisSet {
        let kinds: Vec<_> = strikes
            .iter()
            .map(|&strike| crate::domain::BasisKind::Call { strike })
            .collect();
        BasisSet::from_kinds(grid, &kinds)
    }

    #[test]
    fn exact_basket_is_recovered_without_penalty() {
        let grid = Grid::linspace(50.0, 150.0, 101).unwrap();
        let basis = calls(&grid, &[60.0, 90.0, 120.0]);
        let target = crate::domain::TargetPayoff::from_fn(&grid, |s| {
            2.0 * (s - 60.0).max(0.0) - 1.5 * (s - 90.0).max(0.0) + 0.5 * (s - 120.0).max(0.0)
        });

        let w = fit(&target, &basis, PenaltyKind::L2, 0.0).unwrap();
        assert!((w.get("call@60").unwrap() - 2.0).abs() < 1e-9);
        assert!((w.get("call@90").unwrap() + 1.5).abs() < 1e-9);
        assert!((w.get("call@120").unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn negative_penalty_is_rejected() {
        let grid = Grid::linspace(50.0, 150.0, 11).unwrap();
        let basis = calls(&grid, &[100.0]);
        let target = TargetPayoff::from_fn(&grid, |s| s);
        let err = fit(&target, &basis, PenaltyKind::L1, -0.1).unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));
    }

    #[test]
    fn shifted_grid_is_a_grid_mismatch() {
        let grid = Grid::linspace(50.0, 150.0, 11).unwrap();
        let other = Grid::linspace(51.0, 151.0, 11).unwrap();
        let basis = calls(&other, &[100.0]);
        let target = TargetPayoff::from_fn(&grid, |s| s);
        let err = fit(&target, &basis, PenaltyKind::L2, 0.1).unwrap_err();
        assert!(matches!(err, FitError::GridMismatch { index: 0, .. }));
    }

    #[test]
    fn report_diagnostics_are_consistent() {
        let grid = Grid::linspace(50.0, 150.0, 51).unwrap();
        let basis = BasisSet::from_strikes(&grid, &[80.0, 100.0, 120.0], false).unwrap();
        let target = crate::models::TargetSpec::Showcase.sample(&grid);

        let report =
            fit_with_method(&target, &basis, FitMethod::L1, 0.1, &FitOptions::default()).unwrap();
        assert_eq!(report.weights.len(), basis.len());
        assert_eq!(report.reconstruction.len(), grid.len());
        assert!(report.rmse <= report.max_abs_error + 1e-12);
    }

    fn default_basis(grid: &Grid) -> BasisSet {
        let cfg = crate::domain::RunConfig::default();
        BasisSet::from_strikes(grid, &cfg.strikes, cfg.call_put_parity).unwrap()
    }

    #[test]
    fn l1_step_cap_returns_unconverged_report() {
        let grid = Grid::around_spot(100.0, 100).unwrap();
        let basis = default_basis(&grid);
        let target = crate::models::TargetSpec::Showcase.sample(&grid);
        let opts = FitOptions {
            lasso: LassoOptions {
                max_iter: 2,
                ..LassoOptions::default()
            },
            ..FitOptions::default()
        };

        let report = fit_with_method(&target, &basis, FitMethod::L1, 0.1, &opts).unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, 2);
        assert_eq!(report.weights.len(), basis.len());
    }

    #[test]
    fn l1_on_default_basis_is_optimal() {
        let grid = Grid::around_spot(100.0, 100).unwrap();
        let basis = default_basis(&grid);
        let target = crate::models::TargetSpec::Showcase.sample(&grid);

        let report =
            fit_with_method(&target, &basis, FitMethod::L1, 0.1, &FitOptions::default()).unwrap();
        assert!(report.converged);

        let a = basis.design_matrix();
        let b = DVector::from_column_slice(&target.values);
        let w = DVector::from_column_slice(report.weights.values());
        assert!(kkt_violation(&a, &b, &w, 0.1) < 1e-8);
    }
}
