//! Shared domain types.
//!
//! These types are kept lightweight and (where useful) serializable so they can be:
//!
//! - used in-memory during fitting
//! - read from a JSON run configuration
//! - exported next to the generated plots

use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Ordered, strictly increasing set of underlying prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    points: Vec<f64>,
}

impl Grid {
    pub fn new(points: Vec<f64>) -> Result<Self, FitError> {
        if points.is_empty() {
            return Err(FitError::invalid("Grid must contain at least one price."));
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(FitError::invalid(format!("Grid contains a non-finite price: {bad}")));
        }
        if let Some(i) = points.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FitError::invalid(format!(
                "Grid must be strictly increasing (index {}: {} -> {}).",
                i + 1,
                points[i],
                points[i + 1]
            )));
        }
        Ok(Self { points })
    }

    /// `n` evenly spaced prices from `lower` to `upper` (inclusive).
    pub fn linspace(lower: f64, upper: f64, n: usize) -> Result<Self, FitError> {
        if !(lower.is_finite() && upper.is_finite() && upper > lower) {
            return Err(FitError::invalid(format!(
                "Invalid grid range: lower={lower}, upper={upper} (must be finite and upper>lower)."
            )));
        }
        if n < 2 {
            return Err(FitError::invalid("Grid resolution must be >= 2."));
        }
        let step = (upper - lower) / (n as f64 - 1.0);
        let mut points: Vec<f64> = (0..n).map(|i| lower + step * i as f64).collect();
        // Pin the last point so accumulated rounding never overshoots `upper`.
        points[n - 1] = upper;
        Self::new(points)
    }

    /// Fit grid spanning `[0.5 * spot, 1.5 * spot]`.
    pub fn around_spot(spot: f64, n: usize) -> Result<Self, FitError> {
        if !(spot.is_finite() && spot > 0.0) {
            return Err(FitError::invalid(format!("Spot must be finite and > 0, got {spot}.")));
        }
        Self::linspace(0.5 * spot, 1.5 * spot, n)
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn lower(&self) -> f64 {
        self.points[0]
    }

    pub fn upper(&self) -> f64 {
        self.points[self.points.len() - 1]
    }
}

/// Target values sampled on a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPayoff {
    pub grid: Grid,
    pub values: Vec<f64>,
}

impl TargetPayoff {
    /// Wrap pre-sampled values. Length is checked by the approximator, not here,
    /// so that a mismatch surfaces as `DimensionMismatch` at fit time.
    pub fn new(grid: Grid, values: Vec<f64>) -> Self {
        Self { grid, values }
    }

    pub fn from_fn(grid: &Grid, f: impl Fn(f64) -> f64) -> Self {
        let values = grid.points().iter().map(|&s| f(s)).collect();
        Self {
            grid: grid.clone(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Analytic shape of a basis column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BasisKind {
    /// `max(S - K, 0)`
    Call { strike: f64 },
    /// `max(K - S, 0)`
    Put { strike: f64 },
    /// Linear spot position `S`.
    Spot,
}

impl BasisKind {
    /// Evaluate the payoff at price `s`.
    pub fn eval(self, s: f64) -> f64 {
        match self {
            BasisKind::Call { strike } => (s - strike).max(0.0),
            BasisKind::Put { strike } => (strike - s).max(0.0),
            BasisKind::Spot => s,
        }
    }

    pub fn label(self) -> String {
        match self {
            BasisKind::Call { strike } => format!("call@{}", fmt_strike(strike)),
            BasisKind::Put { strike } => format!("put@{}", fmt_strike(strike)),
            BasisKind::Spot => "spot".to_string(),
        }
    }

    pub fn strike(self) -> Option<f64> {
        match self {
            BasisKind::Call { strike } | BasisKind::Put { strike } => Some(strike),
            BasisKind::Spot => None,
        }
    }
}

/// Inverse of [`BasisKind::label`]: `call@K`, `put@K`, or `spot`.
impl FromStr for BasisKind {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "spot" {
            return Ok(BasisKind::Spot);
        }
        let bad = || FitError::invalid(format!("Unknown basis column '{s}'."));
        let (kind, strike) = s.split_once('@').ok_or_else(bad)?;
        let strike: f64 = strike.parse().map_err(|_| bad())?;
        if !(strike.is_finite() && strike > 0.0) {
            return Err(bad());
        }
        match kind {
            "call" => Ok(BasisKind::Call { strike }),
            "put" => Ok(BasisKind::Put { strike }),
            _ => Err(bad()),
        }
    }
}

/// Strikes print without a trailing `.0` when integral (`call@100`, `put@97.5`).
pub fn fmt_strike(k: f64) -> String {
    if k.fract() == 0.0 && k.abs() < 1e15 {
        format!("{k:.0}")
    } else {
        format!("{k}")
    }
}

/// One named basis column.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisFunction {
    pub name: String,
    pub kind: BasisKind,
    pub values: Vec<f64>,
}

/// Candidate payoff columns aligned to a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisSet {
    pub grid: Grid,
    pub functions: Vec<BasisFunction>,
}

impl BasisSet {
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.functions.iter().map(|f| f.name.clone()).collect()
    }
}

/// Fitted coefficients keyed by basis name, in basis order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeightsRepr")]
pub struct Weights {
    names: Vec<String>,
    values: Vec<f64>,
}

/// Unchecked wire form of [`Weights`].
#[derive(Deserialize)]
struct WeightsRepr {
    names: Vec<String>,
    values: Vec<f64>,
}

impl TryFrom<WeightsRepr> for Weights {
    type Error = FitError;

    fn try_from(raw: WeightsRepr) -> Result<Self, Self::Error> {
        Weights::try_new(raw.names, raw.values)
    }
}

impl Weights {
    /// # Panics
    /// Panics if `names` and `values` differ in length.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        assert_eq!(names.len(), values.len(), "weights must pair one value per name");
        Self { names, values }
    }

    pub fn try_new(names: Vec<String>, values: Vec<f64>) -> Result<Self, FitError> {
        if names.len() != values.len() {
            return Err(FitError::invalid(format!(
                "Weights pair {} names with {} values.",
                names.len(),
                values.len()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn l1_norm(&self) -> f64 {
        self.values.iter().map(|w| w.abs()).sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|w| w * w).sum::<f64>().sqrt()
    }

    pub fn nonzero_count(&self) -> usize {
        self.values.iter().filter(|w| **w != 0.0).count()
    }
}

/// Penalty applied to the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PenaltyKind {
    L1,
    L2,
}

/// Approximation method as exposed on the CLI and in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitMethod {
    /// Squared error + L2 penalty (ridge).
    L2,
    /// Squared error + L1 penalty (lasso).
    L1,
    /// Target-weighted absolute error + L1 penalty.
    Weighted,
}

impl FitMethod {
    pub fn display_name(self) -> &'static str {
        match self {
            FitMethod::L2 => "L2",
            FitMethod::L1 => "L1",
            FitMethod::Weighted => "Weighted Error",
        }
    }

    /// Legend title for plotted curves.
    pub fn series_title(self) -> &'static str {
        match self {
            FitMethod::L2 => "L2 Approximation",
            FitMethod::L1 => "L1 Approximation",
            FitMethod::Weighted => "Weighted Error",
        }
    }

    /// Column key used in `.dat` headers and JSON.
    pub fn key(self) -> &'static str {
        match self {
            FitMethod::L2 => "l2",
            FitMethod::L1 => "l1",
            FitMethod::Weighted => "weighted",
        }
    }
}

/// Output of one approximation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub method: FitMethod,
    pub penalty_strength: f64,
    pub weights: Weights,
    /// Weighted sum of the basis on the fit grid.
    pub reconstruction: Vec<f64>,
    pub rmse: f64,
    pub max_abs_error: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Observation noise added to the sampled target (seeded, deterministic).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    pub std: f64,
    pub seed: u64,
}

/// A full run's configuration as understood by the pipeline.
///
/// Built from (in increasing precedence) defaults, a JSON config file, and CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub spot: f64,
    /// Fit grid resolution (spans `[0.5 * spot, 1.5 * spot]`).
    pub grid_points: usize,
    /// Evaluation grid for exported curves and plots.
    pub eval_lower: f64,
    pub eval_upper: f64,
    pub eval_points: usize,

    pub target: crate::models::TargetSpec,
    pub strikes: Vec<f64>,
    /// Express puts through calls + a spot position instead of listing them.
    pub call_put_parity: bool,

    pub methods: Vec<FitMethod>,
    pub regularization: f64,
    pub noise: Option<NoiseConfig>,

    pub output_dir: PathBuf,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            spot: 100.0,
            grid_points: 100,
            eval_lower: 50.0,
            eval_upper: 150.0,
            eval_points: 500,
            target: crate::models::TargetSpec::Showcase,
            strikes: vec![70.0, 80.0, 90.0, 100.0, 105.0, 110.0, 120.0, 130.0, 98.0],
            call_put_parity: false,
            methods: vec![FitMethod::L2, FitMethod::L1, FitMethod::Weighted],
            regularization: 0.1,
            noise: None,
            output_dir: PathBuf::from("latex"),
            plot: false,
            plot_width: 100,
            plot_height: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rejects_non_increasing_points() {
        assert!(Grid::new(vec![1.0, 2.0, 2.0]).is_err());
        assert!(Grid::new(vec![]).is_err());
        assert!(Grid::new(vec![1.0, f64::NAN]).is_err());
        assert!(Grid::new(vec![1.0, 2.0, 3.5]).is_ok());
    }

    #[test]
    fn linspace_hits_both_ends() {
        let g = Grid::linspace(50.0, 150.0, 100).unwrap();
        assert_eq!(g.len(), 100);
        assert_eq!(g.lower(), 50.0);
        assert_eq!(g.upper(), 150.0);

        let spot = Grid::around_spot(100.0, 100).unwrap();
        assert_eq!(spot, g);
    }

    #[test]
    fn basis_kind_labels_and_values() {
        let call = BasisKind::Call { strike: 100.0 };
        let put = BasisKind::Put { strike: 97.5 };
        assert_eq!(call.label(), "call@100");
        assert_eq!(put.label(), "put@97.5");
        assert_eq!(call.eval(110.0), 10.0);
        assert_eq!(call.eval(90.0), 0.0);
        assert_eq!(put.eval(90.0), 7.5);
        assert_eq!(BasisKind::Spot.eval(42.0), 42.0);
    }

    #[test]
    fn basis_kind_parses_its_own_labels() {
        for kind in [
            BasisKind::Call { strike: 100.0 },
            BasisKind::Put { strike: 97.5 },
            BasisKind::Spot,
        ] {
            assert_eq!(kind.label().parse::<BasisKind>().unwrap(), kind);
        }
        assert!("straddle@100".parse::<BasisKind>().is_err());
        assert!("call@-5".parse::<BasisKind>().is_err());
        assert!("call".parse::<BasisKind>().is_err());
    }

    #[test]
    fn weights_lookup_and_norms() {
        let w = Weights::new(
            vec!["call@90".into(), "put@90".into(), "spot".into()],
            vec![1.5, 0.0, -2.0],
        );
        assert_eq!(w.get("put@90"), Some(0.0));
        assert_eq!(w.get("call@80"), None);
        assert!((w.l1_norm() - 3.5).abs() < 1e-12);
        assert!((w.l2_norm() - 2.5).abs() < 1e-12);
        assert_eq!(w.nonzero_count(), 2);
    }

    #[test]
    fn weights_json_must_pair_names_and_values() {
        let ok: Weights =
            serde_json::from_str(r#"{ "names": ["call@90", "spot"], "values": [1.0, -0.5] }"#)
                .unwrap();
        assert_eq!(ok.get("spot"), Some(-0.5));

        let short = serde_json::from_str::<Weights>(
            r#"{ "names": ["call@90", "spot"], "values": [1.0] }"#,
        );
        let msg = short.unwrap_err().to_string();
        assert!(msg.contains("2 names with 1 values"), "{msg}");
    }

    #[test]
    fn run_config_fills_missing_fields_from_defaults() {
        let cfg: RunConfig = serde_json::from_str(r#"{ "regularization": 0.5 }"#).unwrap();
        assert_eq!(cfg.regularization, 0.5);
        assert_eq!(cfg.strikes.len(), 9);
        assert_eq!(cfg.grid_points, 100);
    }
}
