//! Command-line parsing for the payoff approximation tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code. Every run option is optional here so that
//! unset flags fall through to the config file (or built-in defaults).

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::FitMethod;
use crate::models::TargetSpec;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "pfit",
    version,
    about = "Approximate payoff profiles with regularized vanilla option baskets"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// JSON run configuration (defaults to $PFIT_CONFIG when set).
    #[arg(short, long, global = true, value_name = "JSON")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every configured method, print weights, and write the paper artifacts
    /// (.dat tables, pgfplots .tex, SVG charts, weights JSON).
    Compare(RunArgs),
    /// Fit a single method and print its weights.
    Fit(FitArgs),
    /// Sweep the penalty strength and print norms/sparsity/error per strength.
    Path(PathArgs),
    /// Re-evaluate baskets from a weights JSON without refitting.
    Eval(EvalArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone, Default)]
pub struct RunArgs {
    /// Spot price; the fit grid spans [0.5*spot, 1.5*spot].
    #[arg(long)]
    pub spot: Option<f64>,

    /// Number of fit grid points.
    #[arg(long)]
    pub grid_points: Option<usize>,

    /// Lower bound of the evaluation (plot) grid.
    #[arg(long)]
    pub eval_lower: Option<f64>,

    /// Upper bound of the evaluation (plot) grid.
    #[arg(long)]
    pub eval_upper: Option<f64>,

    /// Number of evaluation grid points.
    #[arg(long)]
    pub eval_points: Option<usize>,

    /// Target payoff: showcase | straddle:K | call-spread:K1:K2 | digital:K:AMOUNT.
    #[arg(short, long)]
    pub target: Option<TargetSpec>,

    /// Comma-separated option strikes.
    #[arg(short = 'k', long, value_delimiter = ',')]
    pub strikes: Option<Vec<f64>>,

    /// Use calls plus a spot position instead of calls and puts.
    #[arg(long)]
    pub parity: bool,

    /// Penalty strength (gamma).
    #[arg(short = 'g', long)]
    pub regularization: Option<f64>,

    /// Methods to run (comma-separated).
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub methods: Option<Vec<FitMethod>>,

    /// Standard deviation of Gaussian noise added to the target samples.
    #[arg(long)]
    pub noise_std: Option<f64>,

    /// Seed for the target noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output directory (defaults to $PFIT_OUT_DIR, else ./latex).
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Render an ASCII preview in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long)]
    pub width: Option<usize>,

    /// Plot height (rows).
    #[arg(long)]
    pub height: Option<usize>,
}

/// Options for `pfit fit`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Method to fit.
    #[arg(long, value_enum, default_value_t = FitMethod::L2)]
    pub method: FitMethod,

    /// Also write the weights JSON to this path.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

/// Options for `pfit path`.
#[derive(Debug, Args, Clone)]
pub struct PathArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Method to sweep.
    #[arg(long, value_enum, default_value_t = FitMethod::L1)]
    pub method: FitMethod,

    /// Smallest positive strength.
    #[arg(long, default_value_t = 1e-3)]
    pub min: f64,

    /// Largest strength.
    #[arg(long, default_value_t = 100.0)]
    pub max: f64,

    /// Number of log-spaced strengths.
    #[arg(long, default_value_t = 16)]
    pub steps: usize,

    /// Prepend strength 0 (fails on a degenerate basis).
    #[arg(long)]
    pub include_zero: bool,

    /// Export the path to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Options for `pfit eval`.
#[derive(Debug, Args, Clone)]
pub struct EvalArgs {
    /// Weights JSON written by `pfit compare` or `pfit fit --export`.
    #[arg(value_name = "JSON")]
    pub weights: PathBuf,

    /// Lower bound of the evaluation grid (defaults to the stored run's).
    #[arg(long)]
    pub eval_lower: Option<f64>,

    /// Upper bound of the evaluation grid.
    #[arg(long)]
    pub eval_upper: Option<f64>,

    /// Number of evaluation grid points.
    #[arg(long)]
    pub eval_points: Option<usize>,

    /// Render an ASCII preview in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long)]
    pub width: Option<usize>,

    /// Plot height (rows).
    #[arg(long)]
    pub height: Option<usize>,

    /// Write the evaluated curves to this `.dat` table.
    #[arg(long, value_name = "DAT")]
    pub export: Option<PathBuf>,
}
