//! Input/output helpers.
//!
//! - table ingest + cleaning (`ingest`)
//! - per-sample CSV exports (`export`)
//! - comparison JSON read/write (`comparison`)
//! - blank starting tables (`template`)

pub mod comparison;
pub mod export;
pub mod ingest;
pub mod template;

pub use comparison::*;
pub use export::*;
pub use ingest::*;
pub use template::*;
