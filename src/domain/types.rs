//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages as immutable values
//! - exported to CSV/JSON
//! - rebuilt from scratch whenever an input table changes

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Volume of release medium (mL) used when none is configured.
pub const DEFAULT_SAMPLE_VOLUME: f64 = 25.0;

/// Upper bound on the number of samples compared in one session.
pub const MAX_SAMPLES: usize = 9;

/// One calibration standard: a known concentration (µg/mL) and its absorbance (AU).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub concentration: f64,
    pub absorbance: f64,
}

impl CalibrationPoint {
    pub fn new(concentration: f64, absorbance: f64) -> Self {
        Self {
            concentration,
            absorbance,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.concentration.is_finite() && self.absorbance.is_finite()
    }
}

/// Where a calibration model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// Least-squares fit over the standards.
    Fitted,
    /// Documented stand-in used when the standards cannot support a fit.
    Fallback,
}

/// Concentration span covered by the calibration standards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardsRange {
    pub min: f64,
    pub max: f64,
}

/// Linear standard curve: `absorbance = slope * concentration + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub slope: f64,
    pub intercept: f64,
    /// Squared Pearson correlation of fitted vs observed absorbance.
    ///
    /// `None` for the fallback model.
    pub r_squared: Option<f64>,
    /// Number of standards the model was fitted on.
    pub n_points: usize,
    pub source: ModelSource,
    /// Concentration range of the standards (absent for the fallback model).
    pub standards: Option<StandardsRange>,
}

impl CalibrationModel {
    pub const FALLBACK_SLOPE: f64 = 1.0;
    pub const FALLBACK_INTERCEPT: f64 = 0.0;

    /// The stand-in model used when no line can be fitted.
    pub fn fallback() -> Self {
        Self {
            slope: Self::FALLBACK_SLOPE,
            intercept: Self::FALLBACK_INTERCEPT,
            r_squared: None,
            n_points: 0,
            source: ModelSource::Fallback,
            standards: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ModelSource::Fallback
    }

    /// Absorbance predicted by the line at `concentration`.
    pub fn predict_absorbance(&self, concentration: f64) -> f64 {
        self.slope * concentration + self.intercept
    }

    /// Human-readable equation, e.g. `A = 0.005000·C + 0.000100`.
    pub fn equation(&self) -> String {
        let sign = if self.intercept < 0.0 { '-' } else { '+' };
        format!("A = {:.6}·C {sign} {:.6}", self.slope, self.intercept.abs())
    }

    /// Whether `concentration` lies above the highest standard.
    pub fn is_extrapolated(&self, concentration: f64) -> bool {
        self.standards
            .map(|range| concentration > range.max)
            .unwrap_or(false)
    }
}

/// One raw row of a sample's time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReleaseReading {
    /// Time since the start of the release experiment (h).
    pub time: f64,
    /// Measured absorbance (AU).
    pub absorbance: f64,
}

impl ReleaseReading {
    pub fn new(time: f64, absorbance: f64) -> Self {
        Self { time, absorbance }
    }
}

/// A computed release row.
///
/// Field order is the CSV export column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub time: f64,
    pub absorbance: f64,
    /// µg/mL
    pub concentration: f64,
    /// µg
    pub amount_released: f64,
    /// µg
    pub cumulative_release: f64,
}

/// One experimental release sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub label: String,
    /// Readings in entry order (not re-sorted).
    pub readings: Vec<ReleaseReading>,
    /// Volume of release medium (mL); scales concentration to mass.
    pub sample_volume: f64,
}

impl Sample {
    pub fn new(label: impl Into<String>, readings: Vec<ReleaseReading>, sample_volume: f64) -> Self {
        Self {
            label: label.into(),
            readings,
            sample_volume,
        }
    }
}

/// Session configuration as understood by the pipeline.
///
/// This is derived from CLI flags and environment (plus defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Applied uniformly to every sample.
    pub sample_volume: f64,
    pub max_samples: usize,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            sample_volume: DEFAULT_SAMPLE_VOLUME,
            max_samples: MAX_SAMPLES,
        }
    }
}

impl ReleaseConfig {
    pub fn with_sample_volume(sample_volume: f64) -> Self {
        Self {
            sample_volume,
            ..Self::default()
        }
    }

    /// Validate the configuration before any computation runs.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.sample_volume.is_finite() && self.sample_volume > 0.0) {
            return Err(AppError::new(
                2,
                format!("Sample volume must be finite and > 0 (got {}).", self.sample_volume),
            ));
        }
        if self.max_samples == 0 || self.max_samples > MAX_SAMPLES {
            return Err(AppError::new(
                2,
                format!("Maximum sample count must be in 1..={MAX_SAMPLES}."),
            ));
        }
        Ok(())
    }

    /// Check a user-selected sample count against the configured bound.
    pub fn check_sample_count(&self, count: usize) -> Result<(), AppError> {
        if count == 0 {
            return Err(AppError::new(3, "No release samples were provided."));
        }
        if count > self.max_samples {
            return Err(AppError::new(
                2,
                format!("Too many samples: {count} (at most {} are supported).", self.max_samples),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_model_is_tagged() {
        let m = CalibrationModel::fallback();
        assert!(m.is_fallback());
        assert_eq!(m.slope, 1.0);
        assert_eq!(m.intercept, 0.0);
        assert!(m.r_squared.is_none());
        assert!(!m.is_extrapolated(1e9));
    }

    #[test]
    fn equation_formats_negative_intercept() {
        let m = CalibrationModel {
            intercept: -0.01,
            slope: 0.005,
            ..CalibrationModel::fallback()
        };
        assert_eq!(m.equation(), "A = 0.005000·C - 0.010000");
    }

    #[test]
    fn config_rejects_non_positive_volume() {
        assert!(ReleaseConfig::with_sample_volume(0.0).validate().is_err());
        assert!(ReleaseConfig::with_sample_volume(f64::NAN).validate().is_err());
        assert!(ReleaseConfig::default().validate().is_ok());
    }

    #[test]
    fn sample_count_is_bounded() {
        let config = ReleaseConfig::default();
        assert!(config.check_sample_count(0).is_err());
        assert!(config.check_sample_count(1).is_ok());
        assert!(config.check_sample_count(9).is_ok());
        assert!(config.check_sample_count(10).is_err());
    }
}
