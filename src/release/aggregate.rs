//! Cumulative release per sample.
//!
//! For each reading, in entry order:
//!
//! ```text
//! concentration      = resolve(absorbance)            (µg/mL, ≥ 0)
//! amount_released    = concentration * sample_volume  (µg)
//! cumulative_release = Σ amount_released so far        (µg)
//! ```
//!
//! Readings are never re-sorted; callers are expected to enter them in
//! ascending time for the running total to read as a release curve.

use log::{debug, warn};

use crate::calibration::{ensure_invertible, resolve};
use crate::domain::{CalibrationModel, ReleaseReading, ReleaseRecord, Sample};
use crate::error::{CalibrationError, ReleaseError};

/// Computed release table for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRelease {
    pub label: String,
    pub sample_volume: f64,
    pub records: Vec<ReleaseRecord>,
    /// Readings whose concentration lies above the highest calibration standard.
    pub extrapolated: usize,
    /// Readings left out because they had no finite release value.
    pub skipped: usize,
}

impl SampleRelease {
    /// Final cumulative release (µg), `0.0` for an empty table.
    pub fn total_released(&self) -> f64 {
        self.records.last().map(|r| r.cumulative_release).unwrap_or(0.0)
    }
}

/// Convert one sample's readings into release records.
///
/// Readings without a finite time, concentration or running total are skipped;
/// the remaining ones keep their relative order. Every emitted value is finite.
/// A degenerate model withholds the whole table.
pub fn aggregate(
    readings: &[ReleaseReading],
    model: &CalibrationModel,
    sample_volume: f64,
) -> Result<Vec<ReleaseRecord>, ReleaseError> {
    if !(sample_volume.is_finite() && sample_volume > 0.0) {
        return Err(ReleaseError::InvalidSampleVolume {
            volume: sample_volume,
        });
    }
    ensure_invertible(model)?;

    let mut records = Vec::with_capacity(readings.len());
    let mut cumulative = 0.0;

    for reading in readings {
        if !reading.time.is_finite() {
            debug!("skipping reading with non-finite time {}", reading.time);
            continue;
        }

        let concentration = match resolve(reading.absorbance, model) {
            Ok(c) => c,
            Err(CalibrationError::NonFiniteConcentration { absorbance }) => {
                warn!("skipping reading at t={}: absorbance {absorbance} is out of range", reading.time);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let amount_released = concentration * sample_volume;
        let next = cumulative + amount_released;
        if !next.is_finite() {
            warn!("skipping reading at t={}: released amount overflows", reading.time);
            continue;
        }
        cumulative = next;

        records.push(ReleaseRecord {
            time: reading.time,
            absorbance: reading.absorbance,
            concentration,
            amount_released,
            cumulative_release: cumulative,
        });
    }

    Ok(records)
}

/// Aggregate a `Sample` using its own volume.
pub fn aggregate_sample(sample: &Sample, model: &CalibrationModel) -> Result<SampleRelease, ReleaseError> {
    let records = aggregate(&sample.readings, model, sample.sample_volume)?;
    let extrapolated = records
        .iter()
        .filter(|r| model.is_extrapolated(r.concentration))
        .count();
    let skipped = sample.readings.len() - records.len();

    debug!(
        "sample '{}': {} record(s), total={:.3}ug, extrapolated={}, skipped={}",
        sample.label,
        records.len(),
        records.last().map(|r| r.cumulative_release).unwrap_or(0.0),
        extrapolated,
        skipped
    );

    Ok(SampleRelease {
        label: sample.label.clone(),
        sample_volume: sample.sample_volume,
        records,
        extrapolated,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelSource, StandardsRange};

    fn exact_model() -> CalibrationModel {
        CalibrationModel {
            slope: 0.005,
            intercept: 0.0,
            r_squared: Some(1.0),
            n_points: 6,
            source: ModelSource::Fitted,
            standards: Some(StandardsRange { min: 0.0, max: 200.0 }),
        }
    }

    fn readings() -> Vec<ReleaseReading> {
        [
            (0.0, 0.00),
            (1.0, 0.00),
            (2.0, 0.00),
            (4.0, 0.01),
            (8.0, 0.02),
            (12.0, 0.03),
            (24.0, 0.05),
        ]
        .into_iter()
        .map(|(t, a)| ReleaseReading::new(t, a))
        .collect()
    }

    #[test]
    fn scenario_reaches_550_ug() {
        let records = aggregate(&readings(), &exact_model(), 25.0).unwrap();
        let conc: Vec<f64> = records.iter().map(|r| r.concentration).collect();
        let expected = [0.0, 0.0, 0.0, 2.0, 4.0, 6.0, 10.0];
        for (c, e) in conc.iter().zip(expected) {
            assert!((c - e).abs() < 1e-9, "{c} vs {e}");
        }
        let last = records.last().unwrap();
        assert!((last.cumulative_release - 550.0).abs() < 1e-9);
        assert!((records[3].amount_released - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(aggregate(&[], &exact_model(), 25.0).unwrap().is_empty());
    }

    #[test]
    fn keeps_entry_order() {
        let rs = [ReleaseReading::new(8.0, 0.02), ReleaseReading::new(2.0, 0.01)];
        let records = aggregate(&rs, &exact_model(), 10.0).unwrap();
        assert_eq!(records[0].time, 8.0);
        assert_eq!(records[1].time, 2.0);
        assert!((records[1].cumulative_release - 60.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_readings_are_skipped() {
        let rs = [
            ReleaseReading::new(0.0, 0.01),
            ReleaseReading::new(1.0, f64::NAN),
            ReleaseReading::new(2.0, 0.02),
        ];
        let records = aggregate(&rs, &exact_model(), 1.0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].time, 2.0);
        assert!((records[1].cumulative_release - 6.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_absorbance_never_reaches_the_table() {
        let rs = [
            ReleaseReading::new(0.0, 1e308),
            ReleaseReading::new(1.0, 0.05),
            ReleaseReading::new(2.0, f64::INFINITY),
            ReleaseReading::new(3.0, f64::NAN),
            ReleaseReading::new(4.0, 0.05),
        ];
        let records = aggregate(&rs, &exact_model(), 25.0).unwrap();

        assert_eq!(records.iter().map(|r| r.time).collect::<Vec<_>>(), vec![1.0, 4.0]);
        assert!(records.iter().all(|r| r.concentration.is_finite()
            && r.amount_released.is_finite()
            && r.cumulative_release.is_finite()));
        assert!((records[1].cumulative_release - 500.0).abs() < 1e-9);
    }

    #[test]
    fn overflowing_running_total_is_skipped() {
        // Each reading is finite on its own; together they overflow.
        let rs = [ReleaseReading::new(0.0, 1e300), ReleaseReading::new(1.0, 1e300)];
        let model = CalibrationModel {
            slope: 1e-8,
            ..exact_model()
        };
        let records = aggregate(&rs, &model, 1.0).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].cumulative_release.is_finite());
    }

    #[test]
    fn skipped_readings_are_counted() {
        let sample = Sample::new(
            "S1",
            vec![ReleaseReading::new(0.0, 1e308), ReleaseReading::new(1.0, 0.05)],
            25.0,
        );
        let release = aggregate_sample(&sample, &exact_model()).unwrap();
        assert_eq!(release.skipped, 1);
        assert_eq!(release.records.len(), 1);
    }

    #[test]
    fn degenerate_model_withholds_table() {
        let model = CalibrationModel {
            slope: 0.0,
            ..exact_model()
        };
        let err = aggregate(&readings(), &model, 25.0).unwrap_err();
        assert_eq!(
            err,
            ReleaseError::Calibration(CalibrationError::DegenerateCalibration { slope: 0.0 })
        );
    }

    #[test]
    fn rejects_non_positive_volume() {
        assert!(matches!(
            aggregate(&readings(), &exact_model(), 0.0),
            Err(ReleaseError::InvalidSampleVolume { .. })
        ));
    }

    #[test]
    fn counts_readings_above_highest_standard() {
        let sample = Sample::new(
            "S1",
            vec![ReleaseReading::new(0.0, 0.5), ReleaseReading::new(1.0, 1.5)],
            25.0,
        );
        let release = aggregate_sample(&sample, &exact_model()).unwrap();
        assert_eq!(release.extrapolated, 1);
        assert!((release.total_released() - 25.0 * 400.0).abs() < 1e-6);
    }
}
