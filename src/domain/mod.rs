//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - calibration inputs and the fitted standard curve (`CalibrationPoint`, `CalibrationModel`)
//! - release readings and computed rows (`ReleaseReading`, `ReleaseRecord`, `Sample`)
//! - session configuration (`ReleaseConfig`)

pub mod types;

pub use types::*;
