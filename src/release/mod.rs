//! Per-sample release aggregation.

pub mod aggregate;

pub use aggregate::*;
