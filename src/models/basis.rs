//! Option basis construction and evaluation.
//!
//! The approximator relies on two primitive operations:
//! - build the design matrix `A` (one column per basis payoff, one row per grid price)
//! - reconstruct `A w` for fitted weights (on the fit grid, or on a finer plot grid)

use nalgebra::{DMatrix, DVector};

use crate::domain::{BasisFunction, BasisKind, BasisSet, Grid, Weights};
use crate::error::FitError;

impl BasisSet {
    /// Build a basis of vanilla payoffs sampled on `grid`.
    ///
    /// Order: for each strike, `call@K` then `put@K`. With `parity = true` the puts
    /// are omitted (a put is a call minus a spot position plus cash) and a single
    /// trailing `spot` column is appended instead.
    pub fn from_strikes(grid: &Grid, strikes: &[f64], parity: bool) -> Result<Self, FitError> {
        if strikes.is_empty() {
            return Err(FitError::invalid("At least one strike is required."));
        }
        if let Some(k) = strikes.iter().find(|k| !(k.is_finite() && **k > 0.0)) {
            return Err(FitError::invalid(format!("Strikes must be finite and > 0, got {k}.")));
        }

        let mut kinds = Vec::with_capacity(strikes.len() * 2 + 1);
        for &strike in strikes {
            kinds.push(BasisKind::Call { strike });
            if !parity {
                kinds.push(BasisKind::Put { strike });
            }
        }
        if parity {
            kinds.push(BasisKind::Spot);
        }

        Ok(Self::from_kinds(grid, &kinds))
    }

    /// Sample analytic basis kinds on `grid`.
    pub fn from_kinds(grid: &Grid, kinds: &[BasisKind]) -> Self {
        let functions = kinds
            .iter()
            .map(|&kind| BasisFunction {
                name: kind.label(),
                kind,
                values: grid.points().iter().map(|&s| kind.eval(s)).collect(),
            })
            .collect();
        Self {
            grid: grid.clone(),
            functions,
        }
    }

    /// Rebuild a basis from column labels (`call@K`, `put@K`, `spot`), e.g.
    /// the names stored next to exported weights.
    pub fn from_labels(grid: &Grid, labels: &[String]) -> Result<Self, FitError> {
        let kinds = labels
            .iter()
            .map(|l| l.parse::<BasisKind>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_kinds(grid, &kinds))
    }

    /// Design matrix with `grid.len()` rows and one column per basis function.
    ///
    /// Callers must validate column lengths first (the approximator does).
    pub fn design_matrix(&self) -> DMatrix<f64> {
        let n = self.grid.len();
        let p = self.functions.len();
        DMatrix::from_fn(n, p, |i, j| self.functions[j].values[i])
    }

    /// Weighted sum of the sampled basis values on the basis grid.
    pub fn reconstruct(&self, weights: &Weights) -> Vec<f64> {
        let mut out = vec![0.0; self.grid.len()];
        for (f, &w) in self.functions.iter().zip(weights.values()) {
            for (acc, v) in out.iter_mut().zip(&f.values) {
                *acc += w * v;
            }
        }
        out
    }

    /// Evaluate the fitted basket at arbitrary prices using the analytic payoffs.
    pub fn evaluate(&self, weights: &Weights, prices: &[f64]) -> Vec<f64> {
        prices
            .iter()
            .map(|&s| {
                self.functions
                    .iter()
                    .zip(weights.values())
                    .map(|(f, &w)| w * f.kind.eval(s))
                    .sum()
            })
            .collect()
    }
}

/// `A w` as a plain vector, for callers already holding the design matrix.
pub fn matvec(a: &DMatrix<f64>, w: &DVector<f64>) -> Vec<f64> {
    (a * w).iter().copied().collect()
}
