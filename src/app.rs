//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initialises logging
//! - layers CLI flags over the config file / `.env` / defaults
//! - runs the fits (or reloads stored weights)
//! - prints reports/plots
//! - writes the paper artifacts

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, EvalArgs, FitArgs, PathArgs, RunArgs};
use crate::domain::{NoiseConfig, RunConfig};
use crate::error::AppError;
use crate::plot::{AsciiSeries, render_ascii_plot};
use crate::report::{format_evaluation, format_path, format_run_summary, format_weights};

pub mod pipeline;

/// Entry point for the `pfit` binary.
pub fn run() -> Result<(), AppError> {
    // `pfit` on its own (or with only flags) runs `pfit compare`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(cli.verbose);

    let base = crate::io::load_base_config(cli.config.as_deref())?;

    match cli.command {
        Command::Compare(args) => handle_compare(run_config_from_args(base, &args)),
        Command::Fit(args) => handle_fit(base, args),
        Command::Path(args) => handle_path(base, args),
        Command::Eval(args) => handle_eval(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. in tests) is harmless; ignore the error.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn handle_compare(config: RunConfig) -> Result<(), AppError> {
    let run = pipeline::run_fits(&config, &config.methods)?;

    println!("{}", format_run_summary(&config, &run.prepared.basis));
    for report in &run.reports {
        println!("{}", format_weights(report, &run.prepared.basis));
    }
    if config.plot {
        print_plot(&config, &run.comparison);
    }

    let written = pipeline::write_artifacts(&config, &run)?;
    info!(count = written.len(), dir = %config.output_dir.display(), "artifacts written");
    println!("Wrote {} files to {}", written.len(), config.output_dir.display());
    Ok(())
}

fn handle_fit(base: RunConfig, args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(base, &args.run);
    let run = pipeline::run_fits(&config, &[args.method])?;

    println!("{}", format_run_summary(&config, &run.prepared.basis));
    for report in &run.reports {
        println!("{}", format_weights(report, &run.prepared.basis));
    }
    if config.plot {
        print_plot(&config, &run.comparison);
    }

    if let Some(path) = &args.export {
        crate::io::write_weights_json(path, &config, &run.reports)?;
        info!(path = %path.display(), "wrote weights JSON");
    }
    Ok(())
}

fn handle_path(base: RunConfig, args: PathArgs) -> Result<(), AppError> {
    let config = run_config_from_args(base, &args.run);
    let strengths = crate::fit::strength_grid(args.min, args.max, args.steps, args.include_zero)?;
    let (prepared, points) = pipeline::run_path(&config, args.method, &strengths)?;

    println!("{}", format_run_summary(&config, &prepared.basis));
    println!("{}", format_path(args.method.display_name(), &points));

    if let Some(path) = &args.export {
        crate::io::write_path_csv(path, &points)?;
        info!(path = %path.display(), "wrote path CSV");
    }
    Ok(())
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let file = crate::io::read_weights_json(&args.weights)?;
    let config = eval_config_from_args(file.config.clone(), &args);
    let cmp = pipeline::evaluate_weights_file(&file, &config)?;

    println!(
        "Weights: {} ({} fits, generated {})",
        args.weights.display(),
        file.fits.len(),
        file.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Target: {}", config.target.display_name());
    println!("{}", format_evaluation(&cmp));
    if config.plot {
        print_plot(&config, &cmp);
    }

    if let Some(path) = &args.export {
        pipeline::write_comparison_dat(path, &cmp)?;
        info!(path = %path.display(), "wrote evaluation table");
    }
    Ok(())
}

fn print_plot(config: &RunConfig, cmp: &crate::report::Comparison) {
    const GLYPHS: [char; 3] = ['-', '~', '*'];
    let series: Vec<AsciiSeries<'_>> = cmp
        .series
        .iter()
        .zip(GLYPHS.iter().cycle())
        .map(|((m, v), &glyph)| AsciiSeries {
            glyph,
            label: m.display_name(),
            values: v,
        })
        .collect();
    println!(
        "{}",
        render_ascii_plot(
            &cmp.prices,
            &cmp.target,
            &series,
            config.plot_width,
            config.plot_height,
        )
    );
}

/// Layer CLI flags over a base configuration. Unset flags keep the base value.
pub fn run_config_from_args(base: RunConfig, args: &RunArgs) -> RunConfig {
    let mut c = base;
    if let Some(v) = args.spot {
        c.spot = v;
    }
    if let Some(v) = args.grid_points {
        c.grid_points = v;
    }
    if let Some(v) = args.eval_lower {
        c.eval_lower = v;
    }
    if let Some(v) = args.eval_upper {
        c.eval_upper = v;
    }
    if let Some(v) = args.eval_points {
        c.eval_points = v;
    }
    if let Some(v) = args.target {
        c.target = v;
    }
    if let Some(v) = &args.strikes {
        c.strikes = v.clone();
    }
    if args.parity {
        c.call_put_parity = true;
    }
    if let Some(v) = args.regularization {
        c.regularization = v;
    }
    if let Some(v) = &args.methods {
        c.methods = v.clone();
    }
    if let Some(std) = args.noise_std {
        c.noise = Some(NoiseConfig { std, seed: args.seed });
    }
    if let Some(v) = &args.out {
        c.output_dir = v.clone();
    }
    if args.plot {
        c.plot = true;
    }
    if let Some(v) = args.width {
        c.plot_width = v;
    }
    if let Some(v) = args.height {
        c.plot_height = v;
    }
    c
}

/// Layer `pfit eval` flags over the configuration stored with the weights.
pub fn eval_config_from_args(stored: RunConfig, args: &EvalArgs) -> RunConfig {
    let mut c = stored;
    if let Some(v) = args.eval_lower {
        c.eval_lower = v;
    }
    if let Some(v) = args.eval_upper {
        c.eval_upper = v;
    }
    if let Some(v) = args.eval_points {
        c.eval_points = v;
    }
    c.plot = args.plot;
    if let Some(v) = args.width {
        c.plot_width = v;
    }
    if let Some(v) = args.height {
        c.plot_height = v;
    }
    c
}

/// Rewrite argv so `pfit` defaults to `pfit compare`.
///
/// Rules:
/// - `pfit`                      -> `pfit compare`
/// - `pfit -g 0.2 ...`           -> `pfit compare -g 0.2 ...`
/// - `pfit --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("compare".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "compare" | "fit" | "path" | "eval");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "compare flags".
    if arg1.starts_with('-') {
        argv.insert(1, "compare".to_string());
        return argv;
    }

    argv
}
