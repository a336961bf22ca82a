//! Reporting utilities: evaluated comparison tables and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{BasisSet, FitMethod, Grid, Weights};
use crate::error::AppError;
use crate::models::TargetSpec;

/// Target and every approximation evaluated on the plotting grid.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub prices: Vec<f64>,
    pub target: Vec<f64>,
    pub series: Vec<(FitMethod, Vec<f64>)>,
}

impl Comparison {
    pub fn series(&self, method: FitMethod) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, v)| v.as_slice())
    }

    /// `(rmse, max |error|)` of one series against the target.
    pub fn error_stats(&self, method: FitMethod) -> Option<(f64, f64)> {
        let values = self.series(method)?;
        let n = values.len().max(1) as f64;
        let (sse, max_abs) = values
            .iter()
            .zip(&self.target)
            .fold((0.0, 0.0_f64), |(sse, max_abs), (v, t)| {
                let r = v - t;
                (sse + r * r, max_abs.max(r.abs()))
            });
        Some(((sse / n).sqrt(), max_abs))
    }
}

/// Evaluate the target and each fitted basket on `eval_grid`.
///
/// Each basket is a method with its basis and weights, in basis order.
pub fn build_comparison<'a>(
    eval_grid: &Grid,
    target: &TargetSpec,
    fits: impl IntoIterator<Item = (FitMethod, &'a BasisSet, &'a Weights)>,
) -> Result<Comparison, AppError> {
    let prices = eval_grid.points().to_vec();
    let target_values = prices.iter().map(|&s| target.eval(s)).collect();

    let mut series = Vec::new();
    for (method, basis, weights) in fits {
        let values = basis.evaluate(weights, &prices);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::new(4, "Non-finite reconstruction on the evaluation grid."));
        }
        series.push((method, values));
    }

    Ok(Comparison {
        prices,
        target: target_values,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_stats_compare_series_to_target() {
        let grid = Grid::linspace(90.0, 110.0, 3).unwrap();
        let basis = BasisSet::from_strikes(&grid, &[100.0], true).unwrap();
        let weights = Weights::new(basis.names(), vec![0.0, 0.0]);
        let target = TargetSpec::Straddle { strike: 100.0 };

        let cmp =
            build_comparison(&grid, &target, [(FitMethod::L1, &basis, &weights)]).unwrap();
        assert_eq!(cmp.target, vec![10.0, 0.0, 10.0]);

        let (rmse, max_abs) = cmp.error_stats(FitMethod::L1).unwrap();
        assert!((rmse - (200.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(max_abs, 10.0);
        assert!(cmp.error_stats(FitMethod::L2).is_none());
    }
}
