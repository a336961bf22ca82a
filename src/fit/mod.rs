//! Payoff approximation.
//!
//! Responsibilities:
//!
//! - validate target/basis alignment and fit one method (`approximator`)
//! - sweep penalty strengths in parallel (`path`)
//! - generate log-spaced strength grids (`strength_grid`)

pub mod approximator;
pub mod path;
pub mod strength_grid;

pub use approximator::*;
pub use path::*;
pub use strength_grid::*;
