//! Numerical solvers: ridge/least squares, lasso, and weighted-L1 IRLS.

pub mod irls;
pub mod lasso;
pub mod ols;

pub use irls::*;
pub use lasso::*;
pub use ols::*;
