//! Input/output helpers.
//!
//! - run configuration JSON (`config`)
//! - `.dat` tables and path CSV (`export`)
//! - pgfplots snippets (`tikz`)
//! - weights JSON read/write (`weights`)

pub mod config;
pub mod export;
pub mod tikz;
pub mod weights;

pub use config::*;
pub use export::*;
pub use tikz::*;
pub use weights::*;
