//! Mathematical utilities: line least squares and fit statistics.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
