//! Error types.
//!
//! Two layers:
//!
//! - recoverable domain conditions (`CalibrationError`, `ComparisonError`,
//!   `CellError`) that the pipeline turns into advisories
//! - `AppError`, the fatal application-boundary error carrying a process exit code

/// Conditions raised by the calibration fitter and concentration resolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    /// Fewer than two usable calibration points (or fewer than two distinct
    /// concentrations), so no line can be fitted.
    #[error(
        "Insufficient calibration data: {valid_points} valid point(s), {distinct_concentrations} distinct concentration(s); at least 2 of each are required"
    )]
    InsufficientData {
        valid_points: usize,
        distinct_concentrations: usize,
    },

    /// The calibration line cannot be inverted (zero or non-finite slope).
    #[error("Degenerate calibration: slope {slope} cannot be inverted; concentrations withheld")]
    DegenerateCalibration { slope: f64 },

    /// The reading has no finite concentration (non-finite absorbance or overflow).
    #[error("Absorbance {absorbance} does not resolve to a finite concentration")]
    NonFiniteConcentration { absorbance: f64 },
}

/// Conditions raised while aggregating one sample's release table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReleaseError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error("Sample volume must be finite and > 0 (got {volume})")]
    InvalidSampleVolume { volume: f64 },
}

/// Conditions raised while assembling the multi-sample comparison.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComparisonError {
    #[error("Duplicate sample label '{label}': rename one of the samples before comparing")]
    DuplicateSampleLabel { label: String },
}

/// Why a single table cell could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    #[error("blank cell")]
    Blank,
    #[error("not a number")]
    NotNumeric,
    #[error("non-finite number")]
    NonFinite,
    #[error("negative concentration")]
    NegativeConcentration,
}

/// Fatal error at the application boundary.
///
/// Exit codes:
/// - `2`: input, configuration or I/O error
/// - `3`: no usable data
/// - `4`: internal / numeric error
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<CalibrationError> for AppError {
    fn from(value: CalibrationError) -> Self {
        match value {
            CalibrationError::InsufficientData { .. } => AppError::new(3, value.to_string()),
            CalibrationError::DegenerateCalibration { .. } => AppError::new(4, value.to_string()),
            CalibrationError::NonFiniteConcentration { .. } => AppError::new(2, value.to_string()),
        }
    }
}

impl From<ReleaseError> for AppError {
    fn from(value: ReleaseError) -> Self {
        match value {
            ReleaseError::Calibration(inner) => inner.into(),
            ReleaseError::InvalidSampleVolume { .. } => AppError::new(2, value.to_string()),
        }
    }
}

impl From<ComparisonError> for AppError {
    fn from(value: ComparisonError) -> Self {
        AppError::new(2, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_errors_map_to_exit_codes() {
        let e: AppError = CalibrationError::InsufficientData {
            valid_points: 1,
            distinct_concentrations: 1,
        }
        .into();
        assert_eq!(e.exit_code(), 3);

        let e: AppError = CalibrationError::DegenerateCalibration { slope: 0.0 }.into();
        assert_eq!(e.exit_code(), 4);
        assert!(e.message().contains("Degenerate"));
    }
}
