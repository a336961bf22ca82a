//! `payoff-fit` library crate.
//!
//! Approximates a target payoff profile by a basket of vanilla options, with an
//! L2 (ridge), L1 (lasso), or target-weighted absolute-error objective, and writes
//! the tables, pgfplots snippets, and SVG charts a LaTeX paper consumes.
//!
//! The binary (`pfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the approximator is reusable from other tools or notebooks

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;

pub use domain::{BasisSet, FitMethod, FitReport, Grid, PenaltyKind, TargetPayoff, Weights};
pub use error::{AppError, FitError};
pub use fit::{fit, fit_weighted};
