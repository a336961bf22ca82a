//! Shared "fit pipeline" logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! grid -> target sampling (+ noise) -> basis -> fits -> evaluation -> artifacts
//!
//! Stored weights skip the fitting half: labels -> basis -> evaluation.
//!
//! The commands can then focus on presentation (what to print, what to write).

use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::info;

use crate::domain::{
    BasisSet, FitMethod, FitReport, Grid, NoiseConfig, RunConfig, TargetPayoff,
};
use crate::error::AppError;
use crate::fit::{FitOptions, PathPoint, fit_path, fit_with_method};
use crate::io::{
    DatColumn, PlotSeries, WeightsFile, series_legend, series_style, write_axis, write_dat,
    write_weights_json,
};
use crate::plot::{
    CurveSeries, WeightSeries, curve_legend, render_comparison_svg, render_weights_svg,
};
use crate::report::{Comparison, build_comparison};

/// Sampled inputs shared by all fits of a run.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub grid: Grid,
    pub eval_grid: Grid,
    pub target: TargetPayoff,
    pub basis: BasisSet,
}

/// All computed outputs of a single `compare`/`fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub prepared: Prepared,
    pub reports: Vec<FitReport>,
    pub comparison: Comparison,
}

/// Build grids, sample the target, and construct the option basis.
pub fn prepare(config: &RunConfig) -> Result<Prepared, AppError> {
    let grid = Grid::around_spot(config.spot, config.grid_points)?;
    let eval_grid = Grid::linspace(config.eval_lower, config.eval_upper, config.eval_points)?;

    let mut target = config.target.sample(&grid);
    if let Some(noise) = config.noise {
        add_noise(&mut target, noise)?;
    }

    let basis = BasisSet::from_strikes(&grid, &config.strikes, config.call_put_parity)?;
    info!(
        grid_points = grid.len(),
        columns = basis.len(),
        target = %config.target.display_name(),
        "prepared fit inputs"
    );

    Ok(Prepared {
        grid,
        eval_grid,
        target,
        basis,
    })
}

fn add_noise(target: &mut TargetPayoff, noise: NoiseConfig) -> Result<(), AppError> {
    let normal = Normal::new(0.0, noise.std)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;
    let mut rng = StdRng::seed_from_u64(noise.seed);
    for v in target.values.iter_mut() {
        *v += normal.sample(&mut rng);
    }
    Ok(())
}

/// Fit every method in `methods` at the configured strength.
pub fn run_fits(config: &RunConfig, methods: &[FitMethod]) -> Result<RunOutput, AppError> {
    if methods.is_empty() {
        return Err(AppError::new(2, "No fit methods selected."));
    }
    let prepared = prepare(config)?;
    let opts = FitOptions::default();

    let mut reports = Vec::with_capacity(methods.len());
    for &method in methods {
        let report = fit_with_method(
            &prepared.target,
            &prepared.basis,
            method,
            config.regularization,
            &opts,
        )?;
        info!(
            method = method.key(),
            rmse = report.rmse,
            nonzero = report.weights.nonzero_count(),
            "fitted"
        );
        reports.push(report);
    }

    let comparison = build_comparison(
        &prepared.eval_grid,
        &config.target,
        reports
            .iter()
            .map(|r| (r.method, &prepared.basis, &r.weights)),
    )?;
    Ok(RunOutput {
        prepared,
        reports,
        comparison,
    })
}

/// Fit one method over `strengths`.
pub fn run_path(
    config: &RunConfig,
    method: FitMethod,
    strengths: &[f64],
) -> Result<(Prepared, Vec<PathPoint>), AppError> {
    let prepared = prepare(config)?;
    let points = fit_path(
        &prepared.target,
        &prepared.basis,
        method,
        strengths,
        &FitOptions::default(),
    )?;
    Ok((prepared, points))
}

/// Re-evaluate the baskets of a weights file on `config`'s evaluation grid.
///
/// Each basket's columns are rebuilt from its stored labels, so no refit is
/// needed and the grid may extend past the original fit grid.
pub fn evaluate_weights_file(
    file: &WeightsFile,
    config: &RunConfig,
) -> Result<Comparison, AppError> {
    if file.fits.is_empty() {
        return Err(AppError::new(2, "Weights file contains no fits."));
    }
    let eval_grid = Grid::linspace(config.eval_lower, config.eval_upper, config.eval_points)?;
    let bases = file
        .fits
        .iter()
        .map(|f| BasisSet::from_labels(&eval_grid, f.weights.names()))
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        fits = file.fits.len(),
        eval_points = eval_grid.len(),
        generated_at = %file.generated_at,
        "re-evaluating stored weights"
    );

    build_comparison(
        &eval_grid,
        &config.target,
        file.fits
            .iter()
            .zip(&bases)
            .map(|(f, basis)| (f.method, basis, &f.weights)),
    )
}

/// Write every series of `cmp` to one `.dat` table (`S target <method keys>`).
pub fn write_comparison_dat(path: &Path, cmp: &Comparison) -> Result<(), AppError> {
    let mut columns = vec![
        DatColumn {
            name: "S",
            values: &cmp.prices,
        },
        DatColumn {
            name: "target",
            values: &cmp.target,
        },
    ];
    columns.extend(cmp.series.iter().map(|(m, values)| DatColumn {
        name: m.key(),
        values,
    }));
    write_dat(path, &columns)
}

/// Write `.dat`, `.tex`, SVG, and JSON artifacts into `config.output_dir`.
///
/// Returns the written paths in creation order.
pub fn write_artifacts(config: &RunConfig, run: &RunOutput) -> Result<Vec<PathBuf>, AppError> {
    let dir = &config.output_dir;
    fs::create_dir_all(dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output dir '{}': {e}", dir.display()),
        )
    })?;

    let cmp = &run.comparison;
    let gamma = config.regularization;
    let mut written = Vec::new();

    // L1/L2 comparison: fixed column order l2, l1 for whichever ran.
    let squared: Vec<FitMethod> = [FitMethod::L2, FitMethod::L1]
        .into_iter()
        .filter(|m| cmp.series(*m).is_some())
        .collect();
    if !squared.is_empty() {
        written.extend(write_table_and_axis(
            dir,
            "regularization_comparison",
            "L1 and L2 Regularization Comparison",
            cmp,
            &squared,
            gamma,
        )?);
    }
    if cmp.series(FitMethod::Weighted).is_some() {
        written.extend(write_table_and_axis(
            dir,
            "weighted_loss",
            "Weighted Error Method Comparison",
            cmp,
            &[FitMethod::Weighted],
            gamma,
        )?);
    }

    let curves: Vec<CurveSeries<'_>> = cmp
        .series
        .iter()
        .map(|(m, v)| CurveSeries {
            method: *m,
            label: curve_legend(*m, gamma),
            values: v,
        })
        .collect();
    let svg = dir.join("approximation.svg");
    render_comparison_svg(
        &svg,
        "Target vs. Approximations",
        &cmp.prices,
        &cmp.target,
        &curves,
    )?;
    written.push(svg);

    let weights: Vec<WeightSeries<'_>> = run
        .reports
        .iter()
        .map(|r| WeightSeries {
            method: r.method,
            values: r.weights.values(),
        })
        .collect();
    let svg = dir.join("weights.svg");
    render_weights_svg(&svg, "Option Weights", &run.prepared.basis.names(), &weights)?;
    written.push(svg);

    let json = dir.join("weights.json");
    write_weights_json(&json, config, &run.reports)?;
    written.push(json);

    for p in &written {
        info!(path = %p.display(), "wrote artifact");
    }
    Ok(written)
}

fn write_table_and_axis(
    dir: &Path,
    stem: &str,
    title: &str,
    cmp: &Comparison,
    methods: &[FitMethod],
    gamma: f64,
) -> Result<Vec<PathBuf>, AppError> {
    let mut columns = vec![
        DatColumn {
            name: "S",
            values: &cmp.prices,
        },
        DatColumn {
            name: "target",
            values: &cmp.target,
        },
    ];
    let mut series = Vec::with_capacity(methods.len());
    for (i, &m) in methods.iter().enumerate() {
        let values = cmp
            .series(m)
            .ok_or_else(|| AppError::new(4, format!("Missing {} series.", m.key())))?;
        columns.push(DatColumn { name: m.key(), values });
        series.push(PlotSeries {
            column: i + 2,
            style: series_style(m),
            legend: series_legend(m, gamma),
        });
    }

    let dat_name = format!("{stem}.dat");
    let dat = dir.join(&dat_name);
    write_dat(&dat, &columns)?;

    let tex = dir.join(format!("{stem}.tex"));
    write_axis(&tex, title, &dat_name, &series)?;
    Ok(vec![dat, tex])
}
