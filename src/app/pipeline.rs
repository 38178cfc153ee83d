//! Shared session pipeline used by every front-end command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! cleaned tables -> calibration fit -> per-sample aggregation -> comparison
//!
//! A session is recomputed from scratch on every input change: `run_session`
//! takes immutable inputs and returns an immutable `SessionOutput`, so a
//! calibration change can never leave stale sample tables behind.

use std::fmt;

use log::{info, warn};

use crate::calibration::{CalibrationOutcome, fit_or_fallback};
use crate::compare::{ComparisonSet, assemble_releases};
use crate::domain::{CalibrationPoint, ReleaseConfig, ReleaseReading, Sample};
use crate::error::{AppError, CalibrationError, ComparisonError, ReleaseError};
use crate::io::ingest::{Cleaned, DroppedCell, RawTable, clean_calibration, clean_readings, split_wide_table};
use crate::release::{SampleRelease, aggregate_sample};

/// One sample's cleaned readings, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleInput {
    pub label: String,
    pub readings: Cleaned<ReleaseReading>,
}

/// Everything a session computes from.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInput {
    pub calibration: Cleaned<CalibrationPoint>,
    pub samples: Vec<SampleInput>,
    /// Wide-table sample columns skipped for having no numeric cell.
    pub skipped_columns: Vec<String>,
    /// Wide-table rows dropped because their time cell was unusable.
    pub dropped_times: Vec<DroppedCell>,
}

impl SessionInput {
    /// Calibration table plus one `time, absorbance` table per sample.
    pub fn from_long_tables(calibration: &RawTable, samples: &[(String, RawTable)]) -> Result<Self, AppError> {
        let calibration = clean_calibration(calibration)?;
        let samples = samples
            .iter()
            .map(|(label, table)| {
                Ok(SampleInput {
                    label: label.clone(),
                    readings: clean_readings(table)?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(Self {
            calibration,
            samples,
            skipped_columns: Vec::new(),
            dropped_times: Vec::new(),
        })
    }

    /// Calibration table plus one wide release table (time + a column per sample).
    pub fn from_wide_table(calibration: &RawTable, release: &RawTable) -> Result<Self, AppError> {
        let calibration = clean_calibration(calibration)?;
        let split = split_wide_table(release)?;
        let samples = split
            .samples
            .into_iter()
            .map(|s| SampleInput {
                label: s.label,
                readings: s.readings,
            })
            .collect();

        Ok(Self {
            calibration,
            samples,
            skipped_columns: split.skipped_columns,
            dropped_times: split.dropped_times,
        })
    }
}

/// Per-sample outcome, keeping the sample's position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    /// 1-based position in the session's sample list.
    pub ordinal: usize,
    pub label: String,
    pub outcome: Result<SampleRelease, ReleaseError>,
}

/// Something the user should be told about; never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    FallbackCalibration(CalibrationError),
    DroppedCells { table: String, cells: usize, rows: usize },
    SkippedColumns(Vec<String>),
    SampleWithheld { label: String, reason: ReleaseError },
    Extrapolated { label: String, readings: usize, highest_standard: f64 },
    OutOfRangeReadings { label: String, readings: usize },
    ComparisonWithheld(ComparisonError),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::FallbackCalibration(err) => {
                write!(f, "{err}. Using fallback calibration (slope = 1, intercept = 0); values are not calibrated.")
            }
            Advisory::DroppedCells { table, cells, rows } => {
                write!(f, "{table}: {rows} row(s) skipped ({cells} unusable cell(s)).")
            }
            Advisory::SkippedColumns(labels) => {
                write!(f, "Skipped non-numeric sample column(s): {}.", labels.join(", "))
            }
            Advisory::SampleWithheld { label, reason } => {
                write!(f, "{label}: release table withheld: {reason}.")
            }
            Advisory::Extrapolated {
                label,
                readings,
                highest_standard,
            } => write!(
                f,
                "{label}: {readings} reading(s) above the highest standard ({highest_standard} ug/mL); values are extrapolated."
            ),
            Advisory::OutOfRangeReadings { label, readings } => write!(
                f,
                "{label}: {readings} reading(s) left out (no finite concentration or released amount)."
            ),
            Advisory::ComparisonWithheld(err) => write!(f, "Comparison withheld: {err}."),
        }
    }
}

/// All computed outputs of one session update.
#[derive(Debug, Clone)]
pub struct SessionOutput {
    pub config: ReleaseConfig,
    pub standards: Vec<CalibrationPoint>,
    pub calibration: CalibrationOutcome,
    pub samples: Vec<SampleResult>,
    pub advisories: Vec<Advisory>,
}

impl SessionOutput {
    /// Successfully computed releases with their ordinals, in input order.
    pub fn releases(&self) -> impl Iterator<Item = (usize, &SampleRelease)> {
        self.samples
            .iter()
            .filter_map(|s| s.outcome.as_ref().ok().map(|r| (s.ordinal, r)))
    }

    /// Assemble the comparison over the computed releases.
    pub fn comparison(&self) -> Result<ComparisonSet<'_>, ComparisonError> {
        assemble_releases(self.releases().map(|(_, r)| r))
    }
}

/// Execute the full pipeline over one immutable input snapshot.
pub fn run_session(input: &SessionInput, config: &ReleaseConfig) -> Result<SessionOutput, AppError> {
    config.validate()?;
    config.check_sample_count(input.samples.len())?;

    let mut advisories = Vec::new();

    // 1) Calibration.
    if !input.calibration.dropped.is_empty() {
        advisories.push(dropped_advisory("calibration", &input.calibration));
    }
    let calibration = fit_or_fallback(&input.calibration.rows);
    if let Some(err) = &calibration.advisory {
        advisories.push(Advisory::FallbackCalibration(err.clone()));
    }
    let model = &calibration.model;

    // 2) Input quality for the release tables.
    if !input.skipped_columns.is_empty() {
        advisories.push(Advisory::SkippedColumns(input.skipped_columns.clone()));
    }
    if !input.dropped_times.is_empty() {
        let cells = input.dropped_times.len();
        advisories.push(Advisory::DroppedCells {
            table: "time".to_string(),
            cells,
            rows: cells,
        });
    }

    // 3) Per-sample aggregation; samples are independent of each other.
    let mut samples = Vec::with_capacity(input.samples.len());
    for (idx, sample_input) in input.samples.iter().enumerate() {
        if !sample_input.readings.dropped.is_empty() {
            advisories.push(dropped_advisory(&sample_input.label, &sample_input.readings));
        }

        let sample = Sample::new(
            sample_input.label.clone(),
            sample_input.readings.rows.clone(),
            config.sample_volume,
        );
        let outcome = aggregate_sample(&sample, model);

        match &outcome {
            Ok(release) => {
                if release.skipped > 0 {
                    advisories.push(Advisory::OutOfRangeReadings {
                        label: release.label.clone(),
                        readings: release.skipped,
                    });
                }
                if let Some(range) = model.standards.filter(|_| release.extrapolated > 0) {
                    advisories.push(Advisory::Extrapolated {
                        label: release.label.clone(),
                        readings: release.extrapolated,
                        highest_standard: range.max,
                    });
                }
            }
            Err(reason) => {
                warn!("sample '{}' withheld: {reason}", sample.label);
                advisories.push(Advisory::SampleWithheld {
                    label: sample.label.clone(),
                    reason: reason.clone(),
                });
            }
        }

        samples.push(SampleResult {
            ordinal: idx + 1,
            label: sample.label,
            outcome,
        });
    }

    let mut output = SessionOutput {
        config: config.clone(),
        standards: input.calibration.rows.clone(),
        calibration,
        samples,
        advisories,
    };

    // 4) Comparison is checked here so the advisory lands in the report;
    //    front-ends re-assemble on demand through `SessionOutput::comparison`.
    let withheld = output.comparison().err();
    if let Some(err) = withheld {
        output.advisories.push(Advisory::ComparisonWithheld(err));
    }

    info!(
        "session: {} sample(s), {} computed, {} advisory(ies)",
        output.samples.len(),
        output.releases().count(),
        output.advisories.len()
    );

    Ok(output)
}

fn dropped_advisory<T>(table: &str, cleaned: &Cleaned<T>) -> Advisory {
    Advisory::DroppedCells {
        table: table.to_string(),
        cells: cleaned.dropped.len(),
        rows: cleaned.dropped_rows(),
    }
}
