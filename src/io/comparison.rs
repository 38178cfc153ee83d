//! Read/write comparison JSON files.
//!
//! A comparison JSON is the portable form of one session's results:
//! - the calibration model used
//! - the sample volume
//! - every sample's `(time, cumulative_release)` series plus its summary metrics
//!
//! It can be re-plotted later without the raw tables (`release plot`).

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compare::{ComparisonSet, SeriesSummary, summarize_series};
use crate::domain::CalibrationModel;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub sample_volume: f64,
    pub model: CalibrationModel,
    pub series: Vec<SeriesExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesExport {
    pub label: String,
    pub time: Vec<f64>,
    pub cumulative_release: Vec<f64>,
    pub summary: SeriesSummary,
}

impl ComparisonFile {
    pub fn from_set(set: &ComparisonSet<'_>, model: &CalibrationModel, sample_volume: f64) -> Self {
        let series = set
            .iter()
            .map(|s| {
                let (time, cumulative_release) = s.points().unzip();
                SeriesExport {
                    label: s.label.to_string(),
                    time,
                    cumulative_release,
                    summary: summarize_series(*s),
                }
            })
            .collect();

        Self {
            tool: "release".to_string(),
            generated_at: Utc::now(),
            sample_volume,
            model: model.clone(),
            series,
        }
    }

    /// `(label, points)` pairs ready for plotting.
    pub fn plot_series(&self) -> Vec<(String, Vec<(f64, f64)>)> {
        self.series
            .iter()
            .map(|s| {
                let points = s
                    .time
                    .iter()
                    .copied()
                    .zip(s.cumulative_release.iter().copied())
                    .collect();
                (s.label.clone(), points)
            })
            .collect()
    }
}

/// Write a comparison JSON file.
pub fn write_comparison_json(path: &Path, file: &ComparisonFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create comparison JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write comparison JSON: {e}")))?;
    Ok(())
}

/// Read a comparison JSON file.
pub fn read_comparison_json(path: &Path) -> Result<ComparisonFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open comparison JSON '{}': {e}", path.display())))?;
    let parsed: ComparisonFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid comparison JSON: {e}")))?;
    for s in &parsed.series {
        if s.time.len() != s.cumulative_release.len() {
            return Err(AppError::new(
                2,
                format!("Invalid comparison JSON: series '{}' has mismatched lengths.", s.label),
            ));
        }
    }
    Ok(parsed)
}
