//! Cross-sample comparison.
//!
//! - assemble a label-keyed set of release series (`assemble`)
//! - summarize and rank the series (`summary`)

pub mod assemble;
pub mod summary;

pub use assemble::*;
pub use summary::*;
