//! End-to-end properties of the approximator on realistic option bases.

use nalgebra::{DMatrix, DVector};
use payoff_fit::domain::{BasisKind, RunConfig};
use payoff_fit::fit::{FitOptions, fit_with_method};
use payoff_fit::math::{kkt_violation, lambda_max, weighted_l1_objective};
use payoff_fit::models::TargetSpec;
use payoff_fit::{
    BasisSet, FitError, FitMethod, Grid, PenaltyKind, TargetPayoff, fit, fit_weighted,
};

fn fit_grid() -> Grid {
    Grid::around_spot(100.0, 100).unwrap()
}

/// Calls only: kinks at distinct strikes, full column rank.
fn call_basis(grid: &Grid) -> BasisSet {
    let kinds: Vec<BasisKind> = [70.0, 90.0, 110.0, 130.0]
        .into_iter()
        .map(|strike| BasisKind::Call { strike })
        .collect();
    BasisSet::from_kinds(grid, &kinds)
}

fn design(basis: &BasisSet, target: &TargetPayoff) -> (DMatrix<f64>, DVector<f64>) {
    (
        basis.design_matrix(),
        DVector::from_column_slice(&target.values),
    )
}

#[test]
fn unpenalized_l2_matches_direct_least_squares() {
    let grid = fit_grid();
    let basis = call_basis(&grid);
    let target = TargetSpec::Showcase.sample(&grid);

    let weights = fit(&target, &basis, PenaltyKind::L2, 0.0).unwrap();

    let (a, b) = design(&basis, &target);
    let at = a.transpose();
    let direct = (&at * &a).lu().solve(&(&at * &b)).unwrap();

    for (w, d) in weights.values().iter().zip(direct.iter()) {
        assert!((w - d).abs() < 1e-6 * d.abs().max(1.0), "fit {w} vs direct {d}");
    }
}

#[test]
fn stronger_penalty_shrinks_weights() {
    let grid = fit_grid();
    let basis = call_basis(&grid);
    let target = TargetSpec::Showcase.sample(&grid);
    let strengths = [0.01, 0.1, 1.0, 10.0, 100.0, 1_000.0, 10_000.0];

    let l2_norms: Vec<f64> = strengths
        .iter()
        .map(|&s| fit(&target, &basis, PenaltyKind::L2, s).unwrap().l2_norm())
        .collect();
    for w in l2_norms.windows(2) {
        assert!(w[1] <= w[0] + 1e-9, "L2 norm grew: {l2_norms:?}");
    }

    let l1_norms: Vec<f64> = strengths
        .iter()
        .map(|&s| fit(&target, &basis, PenaltyKind::L1, s).unwrap().l1_norm())
        .collect();
    for w in l1_norms.windows(2) {
        assert!(w[1] <= w[0] * (1.0 + 1e-6) + 1e-9, "L1 norm grew: {l1_norms:?}");
    }
    assert_eq!(*l1_norms.last().unwrap(), 0.0);
}

#[test]
fn l1_is_sparse_and_l2_is_not() {
    let grid = fit_grid();
    let basis = BasisSet::from_strikes(&grid, &RunConfig::default().strikes, false).unwrap();
    let target = TargetSpec::Showcase.sample(&grid);
    let (a, b) = design(&basis, &target);
    let strength = 0.5 * lambda_max(&a, &b);

    let l1 = fit(&target, &basis, PenaltyKind::L1, strength).unwrap();
    assert!(l1.nonzero_count() > 0);
    assert!(l1.nonzero_count() < l1.len(), "expected exact zeros, got {:?}", l1.values());
    assert!(l1.values().iter().any(|w| *w == 0.0));

    for s in [0.1, strength] {
        let l2 = fit(&target, &basis, PenaltyKind::L2, s).unwrap();
        assert_eq!(l2.nonzero_count(), l2.len());
    }
}

#[test]
fn reconstruction_is_the_weighted_sum() {
    let grid = fit_grid();
    let basis = BasisSet::from_strikes(&grid, &[80.0, 100.0, 120.0], true).unwrap();
    let target = TargetSpec::Straddle { strike: 100.0 }.sample(&grid);

    for method in [FitMethod::L2, FitMethod::L1, FitMethod::Weighted] {
        let report =
            fit_with_method(&target, &basis, method, 0.1, &FitOptions::default()).unwrap();
        let reconstructed = basis.reconstruct(&report.weights);

        for i in 0..grid.len() {
            let manual: f64 = basis
                .functions
                .iter()
                .map(|f| report.weights.get(&f.name).unwrap() * f.values[i])
                .sum();
            assert!((manual - report.reconstruction[i]).abs() < 1e-9);
            assert!((manual - reconstructed[i]).abs() < 1e-9);
        }
    }
}

#[test]
fn mismatched_lengths_are_rejected() {
    let target = TargetSpec::Showcase.sample(&Grid::linspace(50.0, 150.0, 50).unwrap());
    let basis = call_basis(&Grid::linspace(50.0, 150.0, 40).unwrap());

    let err = fit(&target, &basis, PenaltyKind::L2, 0.1).unwrap_err();
    assert_eq!(
        err,
        FitError::DimensionMismatch {
            name: "call@70".to_string(),
            expected: 50,
            found: 40,
        }
    );
}

#[test]
fn duplicate_columns_need_a_penalty() {
    let grid = fit_grid();
    let basis = BasisSet::from_kinds(
        &grid,
        &[
            BasisKind::Call { strike: 100.0 },
            BasisKind::Call { strike: 100.0 },
            BasisKind::Put { strike: 90.0 },
        ],
    );
    let target = TargetSpec::Straddle { strike: 100.0 }.sample(&grid);

    for kind in [PenaltyKind::L1, PenaltyKind::L2] {
        let err = fit(&target, &basis, kind, 0.0).unwrap_err();
        assert!(
            matches!(err, FitError::DegenerateBasis { rank: 2, columns: 3 }),
            "got {err:?}"
        );
    }

    // Ridge splits identical columns evenly.
    let w = fit(&target, &basis, PenaltyKind::L2, 0.1).unwrap();
    assert!((w.values()[0] - w.values()[1]).abs() < 1e-9);
}

#[test]
fn weighted_fit_improves_on_its_start() {
    let grid = fit_grid();
    let basis = BasisSet::from_strikes(&grid, &[70.0, 85.0, 100.0, 115.0, 130.0], false).unwrap();
    let target = TargetSpec::Showcase.sample(&grid);
    let gamma = 0.1;

    let report = fit_weighted(&target, &basis, gamma).unwrap();
    let start = fit(&target, &basis, PenaltyKind::L2, gamma).unwrap();

    let (a, b) = design(&basis, &target);
    let c = b.map(f64::abs);
    let obj = |w: &[f64]| {
        weighted_l1_objective(&a, &b, &c, &DVector::from_column_slice(w), gamma)
    };

    let fitted = obj(report.weights.values());
    assert!(fitted <= obj(start.values()) * (1.0 + 1e-9));
    let zeros = vec![0.0; basis.len()];
    assert!(fitted < obj(zeros.as_slice()));
}

fn lasso_objective(a: &DMatrix<f64>, b: &DVector<f64>, w: &[f64], lambda: f64) -> f64 {
    let w = DVector::from_column_slice(w);
    let r = a * &w - b;
    r.norm_squared() / (2.0 * a.nrows() as f64) + lambda * w.lp_norm(1)
}

/// Default run: nine strikes with calls and puts (18 columns, rank 11).
#[test]
fn l1_is_exact_on_the_default_rank_deficient_basis() {
    let cfg = RunConfig::default();
    let grid = Grid::around_spot(cfg.spot, cfg.grid_points).unwrap();
    let target = cfg.target.sample(&grid);

    // Objective values reached by a reference lasso solver on the same data.
    let cases = [(false, 0.1, 15.1530), (true, 0.1, 15.6755), (false, 0.001, 9.1807)];
    for (parity, lambda, reference) in cases {
        let basis = BasisSet::from_strikes(&grid, &cfg.strikes, parity).unwrap();
        let report =
            fit_with_method(&target, &basis, FitMethod::L1, lambda, &FitOptions::default())
                .unwrap();
        assert!(report.converged, "parity={parity} lambda={lambda}");

        let (a, b) = design(&basis, &target);
        let w = DVector::from_column_slice(report.weights.values());
        let kkt = kkt_violation(&a, &b, &w, lambda);
        assert!(kkt < 1e-8, "parity={parity} lambda={lambda} kkt={kkt}");

        let obj = lasso_objective(&a, &b, report.weights.values(), lambda);
        assert!(obj <= reference, "parity={parity} lambda={lambda}: {obj} > {reference}");
    }
}

/// Coarse grids put two strikes in one grid cell and create ties between
/// call and put gradients.
#[test]
fn l1_stays_optimal_across_grids_and_strengths() {
    let cfg = RunConfig::default();
    for points in [25, 40, 60] {
        let grid = Grid::linspace(50.0, 150.0, points).unwrap();
        let target = TargetSpec::Showcase.sample(&grid);
        for parity in [false, true] {
            let basis = BasisSet::from_strikes(&grid, &cfg.strikes, parity).unwrap();
            let (a, b) = design(&basis, &target);
            for i in 0..13 {
                let lambda = 1e-3 * 10f64.powf(i as f64 / 2.0);
                let report = fit_with_method(
                    &target,
                    &basis,
                    FitMethod::L1,
                    lambda,
                    &FitOptions::default(),
                )
                .unwrap();
                assert!(report.converged);
                let w = DVector::from_column_slice(report.weights.values());
                let kkt = kkt_violation(&a, &b, &w, lambda);
                assert!(
                    kkt < 1e-8 * lambda.max(1.0),
                    "points={points} parity={parity} lambda={lambda} kkt={kkt}"
                );
            }
        }
    }
}
