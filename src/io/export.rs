//! Plain-text table exports.
//!
//! - `.dat`: whitespace-separated columns with a `#` header line, the format
//!   pgfplots' `\addplot table` reads directly
//! - `.csv`: regularization path summaries for spreadsheets or scripts

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::AppError;
use crate::fit::PathPoint;

/// A named column of values aligned to the first (`x`) column.
#[derive(Debug, Clone)]
pub struct DatColumn<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

/// Write a `.dat` table: `# name0 name1 ...` then one `{:.6}` row per sample.
pub fn write_dat(path: &Path, columns: &[DatColumn<'_>]) -> Result<(), AppError> {
    let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
    if let Some(bad) = columns.iter().find(|c| c.values.len() != rows) {
        return Err(AppError::new(
            4,
            format!(
                "Column '{}' has {} rows, expected {rows}.",
                bad.name,
                bad.values.len()
            ),
        ));
    }

    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    let io_err = |e: std::io::Error| {
        AppError::new(2, format!("Failed to write '{}': {e}", path.display()))
    };

    let header: Vec<&str> = columns.iter().map(|c| c.name).collect();
    writeln!(out, "# {}", header.join(" ")).map_err(io_err)?;

    for i in 0..rows {
        let row: Vec<String> = columns.iter().map(|c| format!("{:.6}", c.values[i])).collect();
        writeln!(out, "{}", row.join(" ")).map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;
    Ok(())
}

/// Write a regularization path to CSV.
pub fn write_path_csv(path: &Path, points: &[PathPoint]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create path CSV '{}': {e}", path.display()),
        )
    })?;
    let mut out = BufWriter::new(file);
    let io_err = |e: std::io::Error| AppError::new(2, format!("Failed to write path CSV: {e}"));

    writeln!(out, "strength,l1_norm,l2_norm,nonzero,rmse,converged").map_err(io_err)?;
    for p in points {
        writeln!(
            out,
            "{:.10},{:.10},{:.10},{},{:.10},{}",
            p.strength, p.l1_norm, p.l2_norm, p.nonzero, p.rmse, p.converged
        )
        .map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;
    Ok(())
}
