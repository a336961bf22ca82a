//! Regularization path: one method fitted across many penalty strengths.
//!
//! Every strength is an independent fit, so the sweep runs in parallel; results
//! come back in input order regardless of scheduling.

use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{BasisSet, FitMethod, TargetPayoff};
use crate::error::FitError;
use crate::fit::approximator::{FitOptions, fit_with_method};

/// Summary of a single fit along the path.
#[derive(Debug, Clone, Serialize)]
pub struct PathPoint {
    pub strength: f64,
    pub l1_norm: f64,
    pub l2_norm: f64,
    pub nonzero: usize,
    pub rmse: f64,
    pub converged: bool,
}

/// Fit `method` at each strength in `strengths`.
///
/// Fails on the first (lowest-index) error, e.g. `DegenerateBasis` at strength 0.
pub fn fit_path(
    target: &TargetPayoff,
    basis: &BasisSet,
    method: FitMethod,
    strengths: &[f64],
    opts: &FitOptions,
) -> Result<Vec<PathPoint>, FitError> {
    let results: Vec<Result<PathPoint, FitError>> = strengths
        .par_iter()
        .map(|&strength| {
            fit_with_method(target, basis, method, strength, opts).map(|r| PathPoint {
                strength,
                l1_norm: r.weights.l1_norm(),
                l2_norm: r.weights.l2_norm(),
                nonzero: r.weights.nonzero_count(),
                rmse: r.rmse,
                converged: r.converged,
            })
        })
        .collect();

    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Grid;
    use crate::models::TargetSpec;

    #[test]
    fn path_preserves_input_order() {
        let grid = Grid::around_spot(100.0, 60).unwrap();
        let basis = BasisSet::from_strikes(&grid, &[80.0, 100.0, 120.0], false).unwrap();
        let target = TargetSpec::Showcase.sample(&grid);

        let strengths = [5.0, 0.01, 1.0, 0.1];
        let path =
            fit_path(&target, &basis, FitMethod::L2, &strengths, &FitOptions::default())
                .unwrap();
        let got: Vec<f64> = path.iter().map(|p| p.strength).collect();
        assert_eq!(got, strengths.to_vec());
    }

    #[test]
    fn zero_strength_on_degenerate_basis_fails_the_path() {
        let grid = Grid::around_spot(100.0, 60).unwrap();
        // Three call/put pairs span only {1, S, three kinks}: rank 5 of 6.
        let basis = BasisSet::from_strikes(&grid, &[90.0, 100.0, 110.0], false).unwrap();
        let target = TargetSpec::Showcase.sample(&grid);

        let err = fit_path(&target, &basis, FitMethod::L2, &[0.0, 1.0], &FitOptions::default())
            .unwrap_err();
        assert!(matches!(err, FitError::DegenerateBasis { .. }));
    }
}
