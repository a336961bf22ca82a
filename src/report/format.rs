//! Formatted terminal output: run summary, weight tables, regularization paths.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized (golden tests below)

use crate::domain::{BasisKind, BasisSet, FitReport, RunConfig, fmt_strike};
use crate::fit::PathPoint;
use crate::report::Comparison;

/// Header block describing the run inputs.
pub fn format_run_summary(config: &RunConfig, basis: &BasisSet) -> String {
    let mut out = String::new();
    out.push_str("=== pfit - Payoff Approximation with Vanilla Options ===\n");
    out.push_str(&format!("Target: {}\n", config.target.display_name()));
    out.push_str(&format!(
        "Fit grid: n={} | S=[{:.2}, {:.2}]\n",
        basis.grid.len(),
        basis.grid.lower(),
        basis.grid.upper()
    ));
    out.push_str(&format!(
        "Basis: {} columns ({} strikes{})\n",
        basis.len(),
        config.strikes.len(),
        if config.call_put_parity { ", calls + spot" } else { ", calls + puts" }
    ));
    out.push_str(&format!("Regularization: gamma={:.4}\n", config.regularization));
    if let Some(noise) = config.noise {
        out.push_str(&format!("Noise: std={} seed={}\n", noise.std, noise.seed));
    }
    out
}

/// Weight table for one fit, grouped by strike.
///
/// ```text
/// L2 Weights:
/// Strike  70: Call=+0.123 Put=-0.456
/// Spot position: +0.100
/// ```
pub fn format_weights(report: &FitReport, basis: &BasisSet) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} Weights:\n", report.method.display_name()));

    // Strikes in first-seen order; duplicates collapse onto one row.
    let mut strikes: Vec<f64> = Vec::new();
    for f in &basis.functions {
        if let Some(k) = f.kind.strike() {
            if !strikes.contains(&k) {
                strikes.push(k);
            }
        }
    }

    for &k in &strikes {
        let mut row = format!("Strike {:>3}:", fmt_strike(k));
        for (f, &w) in basis.functions.iter().zip(report.weights.values()) {
            match f.kind {
                BasisKind::Call { strike } if strike == k => {
                    row.push_str(&format!(" Call={w:+.3}"))
                }
                BasisKind::Put { strike } if strike == k => row.push_str(&format!(" Put={w:+.3}")),
                _ => {}
            }
        }
        out.push_str(&row);
        out.push('\n');
    }

    for (f, &w) in basis.functions.iter().zip(report.weights.values()) {
        if f.kind == BasisKind::Spot {
            out.push_str(&format!("Spot position: {w:+.3}\n"));
        }
    }

    out.push_str(&format!(
        "  rmse={:.4} max|err|={:.4} nonzero={}/{} iterations={}{}\n",
        report.rmse,
        report.max_abs_error,
        report.weights.nonzero_count(),
        report.weights.len(),
        report.iterations,
        if report.converged { "" } else { " (not converged)" }
    ));
    out
}

/// Error of each stored basket against the target on the evaluation grid.
///
/// ```text
/// Evaluation on S=[50.00, 150.00] (500 points):
///   L1              rmse=0.1234 max|err|=0.5678
/// ```
pub fn format_evaluation(cmp: &Comparison) -> String {
    let (lo, hi) = match (cmp.prices.first(), cmp.prices.last()) {
        (Some(lo), Some(hi)) => (*lo, *hi),
        _ => (0.0, 0.0),
    };
    let mut out = format!(
        "Evaluation on S=[{lo:.2}, {hi:.2}] ({} points):\n",
        cmp.prices.len()
    );
    for (method, _) in &cmp.series {
        if let Some((rmse, max_abs)) = cmp.error_stats(*method) {
            out.push_str(&format!(
                "  {:<15} rmse={rmse:.4} max|err|={max_abs:.4}\n",
                method.display_name()
            ));
        }
    }
    out
}

/// Regularization path table.
pub fn format_path(method_name: &str, points: &[PathPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Regularization path ({method_name}):\n"));
    out.push_str(&format!(
        "{:>12} {:>12} {:>12} {:>8} {:>10}\n",
        "strength", "|w|_1", "|w|_2", "nonzero", "rmse"
    ));
    for p in points {
        out.push_str(&format!(
            "{:>12.6} {:>12.4} {:>12.4} {:>8} {:>10.4}{}\n",
            p.strength,
            p.l1_norm,
            p.l2_norm,
            p.nonzero,
            p.rmse,
            if p.converged { "" } else { " *" }
        ));
    }
    out
}
