//! Plot rendering: SVG charts for the paper and ASCII previews for the terminal.

pub mod ascii;
pub mod chart;

pub use ascii::*;
pub use chart::*;
