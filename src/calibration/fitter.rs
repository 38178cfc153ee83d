//! Standard-curve fitting.
//!
//! Given the calibration standards `(c_i, A_i)` we regress absorbance on
//! concentration:
//!
//! ```text
//! A = slope * c + intercept
//! ```
//!
//! and report goodness-of-fit as the squared Pearson correlation between the
//! fitted and observed absorbances.

use log::{debug, warn};

use crate::domain::{CalibrationModel, CalibrationPoint, ModelSource, StandardsRange};
use crate::error::CalibrationError;
use crate::math::{count_distinct, fit_line, pearson, sum_squared_residuals};

/// Result of fitting with the documented fallback applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutcome {
    pub model: CalibrationModel,
    /// Set when the fallback model had to be substituted.
    pub advisory: Option<CalibrationError>,
}

/// Fit a standard curve to the usable points.
///
/// Points with a non-finite value or a negative concentration are skipped.
/// Fewer than two usable points, or fewer than two distinct concentrations,
/// yields `CalibrationError::InsufficientData`.
pub fn fit(points: &[CalibrationPoint]) -> Result<CalibrationModel, CalibrationError> {
    let usable: Vec<CalibrationPoint> = points
        .iter()
        .copied()
        .filter(|p| p.is_finite() && p.concentration >= 0.0)
        .collect();

    let concentrations: Vec<f64> = usable.iter().map(|p| p.concentration).collect();
    let absorbances: Vec<f64> = usable.iter().map(|p| p.absorbance).collect();

    let distinct = count_distinct(&concentrations);
    let insufficient = || CalibrationError::InsufficientData {
        valid_points: usable.len(),
        distinct_concentrations: distinct,
    };
    if usable.len() < 2 || distinct < 2 {
        return Err(insufficient());
    }

    let mut line = fit_line(&concentrations, &absorbances).ok_or_else(insufficient)?;
    if count_distinct(&absorbances) < 2 {
        // Flat response: SVD leaves round-off in the slope, which would
        // otherwise pass as invertible.
        line.slope = 0.0;
        line.intercept = absorbances[0];
    }

    let fitted: Vec<f64> = concentrations.iter().map(|&c| line.predict(c)).collect();
    // Zero variance on either side means the line explains nothing.
    let r_squared = pearson(&fitted, &absorbances)
        .map(|r| r * r)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    let standards = StandardsRange {
        min: concentrations.iter().copied().fold(f64::INFINITY, f64::min),
        max: concentrations.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };

    debug!(
        "calibration fit: slope={:.6} intercept={:.6} r2={:.5} sse={:.3e} n={}",
        line.slope,
        line.intercept,
        r_squared,
        sum_squared_residuals(&absorbances, &fitted),
        usable.len()
    );

    Ok(CalibrationModel {
        slope: line.slope,
        intercept: line.intercept,
        r_squared: Some(r_squared),
        n_points: usable.len(),
        source: ModelSource::Fitted,
        standards: Some(standards),
    })
}

/// Fit a standard curve, substituting the fallback model when the data is insufficient.
///
/// The fallback (`slope = 1`, `intercept = 0`) keeps downstream stages defined;
/// the returned advisory lets the caller tell the user it is not a fitted value.
pub fn fit_or_fallback(points: &[CalibrationPoint]) -> CalibrationOutcome {
    match fit(points) {
        Ok(model) => CalibrationOutcome {
            model,
            advisory: None,
        },
        Err(err) => {
            warn!("{err}; using fallback calibration (slope=1, intercept=0)");
            CalibrationOutcome {
                model: CalibrationModel::fallback(),
                advisory: Some(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standards() -> Vec<CalibrationPoint> {
        [
            (0.0, 0.00),
            (10.0, 0.05),
            (25.0, 0.12),
            (50.0, 0.25),
            (100.0, 0.50),
            (200.0, 1.00),
        ]
        .into_iter()
        .map(|(c, a)| CalibrationPoint::new(c, a))
        .collect()
    }

    #[test]
    fn six_standards_fit_expected_line() {
        let m = fit(&standards()).unwrap();
        assert!((m.slope - 0.005).abs() < 1e-4, "slope {}", m.slope);
        assert!(m.intercept.abs() < 5e-3, "intercept {}", m.intercept);
        assert!(m.r_squared.unwrap() > 0.99);
        assert_eq!(m.n_points, 6);
        assert_eq!(m.source, ModelSource::Fitted);
        let range = m.standards.unwrap();
        assert_eq!((range.min, range.max), (0.0, 200.0));
    }

    #[test]
    fn two_points_give_exact_line() {
        let pts = [CalibrationPoint::new(2.0, 0.3), CalibrationPoint::new(6.0, 0.9)];
        let m = fit(&pts).unwrap();
        assert!((m.slope - 0.15).abs() < 1e-12);
        assert!(m.intercept.abs() < 1e-12);
        assert!((m.r_squared.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_point_is_insufficient() {
        let err = fit(&[CalibrationPoint::new(10.0, 0.05)]).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::InsufficientData {
                valid_points: 1,
                distinct_concentrations: 1
            }
        );
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let mut pts = standards();
        pts.push(CalibrationPoint::new(f64::NAN, 0.3));
        pts.push(CalibrationPoint::new(30.0, f64::INFINITY));
        let m = fit(&pts).unwrap();
        assert_eq!(m.n_points, 6);
    }

    #[test]
    fn repeated_concentration_is_insufficient() {
        let pts = [CalibrationPoint::new(5.0, 0.1), CalibrationPoint::new(5.0, 0.2)];
        assert!(matches!(
            fit(&pts),
            Err(CalibrationError::InsufficientData {
                valid_points: 2,
                distinct_concentrations: 1
            })
        ));
    }

    #[test]
    fn fallback_substituted_with_advisory() {
        let outcome = fit_or_fallback(&[CalibrationPoint::new(1.0, 0.2)]);
        assert!(outcome.model.is_fallback());
        assert_eq!(outcome.model.slope, 1.0);
        assert_eq!(outcome.model.intercept, 0.0);
        assert!(matches!(
            outcome.advisory,
            Some(CalibrationError::InsufficientData { .. })
        ));
    }

    #[test]
    fn flat_absorbance_fits_zero_slope() {
        let pts = [
            CalibrationPoint::new(0.0, 0.2),
            CalibrationPoint::new(10.0, 0.2),
            CalibrationPoint::new(20.0, 0.2),
        ];
        let m = fit(&pts).unwrap();
        assert_eq!(m.slope, 0.0);
        assert_eq!(m.intercept, 0.2);
        assert_eq!(m.r_squared, Some(0.0));
    }
}
