//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the sampled function model (`Grid`, `TargetPayoff`, `BasisSet`)
//! - fit inputs and outputs (`PenaltyKind`, `FitMethod`, `Weights`, `FitReport`)
//! - the run configuration (`RunConfig`)

pub mod types;

pub use types::*;
