//! Read/write weights JSON files.
//!
//! The weights file is the portable record of a run:
//! - generator + timestamp
//! - the resolved run configuration
//! - per-method weights and fit diagnostics
//!
//! `pfit eval` reloads it to re-evaluate the baskets without refitting.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FitMethod, FitReport, RunConfig, Weights};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub config: RunConfig,
    pub fits: Vec<MethodWeights>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodWeights {
    pub method: FitMethod,
    pub penalty_strength: f64,
    pub weights: Weights,
    pub rmse: f64,
    pub max_abs_error: f64,
    pub converged: bool,
}

impl From<&FitReport> for MethodWeights {
    fn from(r: &FitReport) -> Self {
        Self {
            method: r.method,
            penalty_strength: r.penalty_strength,
            weights: r.weights.clone(),
            rmse: r.rmse,
            max_abs_error: r.max_abs_error,
            converged: r.converged,
        }
    }
}

pub fn write_weights_json(
    path: &Path,
    config: &RunConfig,
    reports: &[FitReport],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create weights JSON '{}': {e}", path.display()),
        )
    })?;

    let doc = WeightsFile {
        tool: "pfit".to_string(),
        generated_at: Utc::now(),
        config: config.clone(),
        fits: reports.iter().map(MethodWeights::from).collect(),
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write weights JSON: {e}")))?;
    Ok(())
}

/// Load a weights file for `pfit eval`. Malformed weights (names and values of
/// different lengths, unknown methods) are rejected here.
pub fn read_weights_json(path: &Path) -> Result<WeightsFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open weights JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid weights JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_survive_a_write_read_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let report = FitReport {
            method: FitMethod::L1,
            penalty_strength: 0.1,
            weights: Weights::new(vec!["call@90".into(), "put@90".into()], vec![0.75, 0.0]),
            reconstruction: vec![],
            rmse: 1.25,
            max_abs_error: 3.0,
            iterations: 12,
            converged: true,
        };

        write_weights_json(&path, &RunConfig::default(), &[report]).unwrap();
        let back = read_weights_json(&path).unwrap();

        assert_eq!(back.tool, "pfit");
        assert_eq!(back.fits.len(), 1);
        assert_eq!(back.fits[0].method, FitMethod::L1);
        assert_eq!(back.fits[0].weights.get("call@90"), Some(0.75));
        assert_eq!(back.config, RunConfig::default());
    }
}
