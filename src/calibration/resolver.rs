//! Back-calculation of concentration from absorbance.
//!
//! Inverts the standard curve:
//!
//! ```text
//! c = (A - intercept) / slope
//! ```
//!
//! Negative results (absorbance below the intercept, typically baseline noise
//! at t = 0) are floored at zero: released mass is never negative. A reading
//! that has no finite concentration is rejected, never coerced.

use crate::domain::CalibrationModel;
use crate::error::CalibrationError;

/// Check that the model can be inverted.
pub fn ensure_invertible(model: &CalibrationModel) -> Result<(), CalibrationError> {
    if model.slope == 0.0 || !model.slope.is_finite() || !model.intercept.is_finite() {
        return Err(CalibrationError::DegenerateCalibration { slope: model.slope });
    }
    Ok(())
}

/// Concentration (µg/mL) for one absorbance reading, floored at zero.
///
/// Never returns a non-finite value: a NaN or infinite absorbance, or one large
/// enough to overflow the division, yields `NonFiniteConcentration`.
pub fn resolve(absorbance: f64, model: &CalibrationModel) -> Result<f64, CalibrationError> {
    ensure_invertible(model)?;

    let concentration = (absorbance - model.intercept) / model.slope;
    if !(absorbance.is_finite() && concentration.is_finite()) {
        return Err(CalibrationError::NonFiniteConcentration { absorbance });
    }
    Ok(concentration.max(0.0))
}
