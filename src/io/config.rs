//! Run configuration files (JSON).
//!
//! Any field may be omitted; missing fields take `RunConfig::default()` values.
//! CLI flags are layered on top by `app::run_config_from_args`.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::RunConfig;
use crate::error::AppError;

/// Environment variable naming a default config file.
pub const CONFIG_ENV: &str = "PFIT_CONFIG";
/// Environment variable naming a default output directory.
pub const OUT_DIR_ENV: &str = "PFIT_OUT_DIR";

pub fn read_config_json(path: &Path) -> Result<RunConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open config '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid config JSON '{}': {e}", path.display())))
}

/// Resolve the base configuration: explicit path, else `PFIT_CONFIG`, else defaults.
///
/// `.env` is loaded first so both variables can live there.
pub fn load_base_config(explicit: Option<&Path>) -> Result<RunConfig, AppError> {
    dotenvy::dotenv().ok();

    let path: Option<PathBuf> = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
    };

    let mut config = match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading run config");
            read_config_json(&p)?
        }
        None => RunConfig::default(),
    };

    if let Some(dir) = std::env::var_os(OUT_DIR_ENV) {
        config.output_dir = PathBuf::from(dir);
    }
    Ok(config)
}
