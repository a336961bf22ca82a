//! Payoff models: the option basis and the target catalogue.
//!
//! Both are small, pure functions of the underlying price so that the fitting
//! code can stay generic over what is being approximated.

pub mod basis;
pub mod target;

pub use basis::*;
pub use target::*;
