//! Table ingest and cleaning.
//!
//! This module is responsible for turning an editable grid of string cells into
//! typed calibration points and release readings.
//!
//! Design goals:
//! - **Stable column set** (missing required columns are a hard error, exit code 2)
//! - **Cell-level coercion** (unparsable cells drop their row, and are reported)
//! - **Entry order preserved** (rows are never re-sorted)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::warn;

use crate::domain::{CalibrationPoint, ReleaseReading};
use crate::error::{AppError, CellError};

/// One data row of a raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based source line (header is line 1).
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// A table of string-or-numeric cells with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Build a table from in-memory cells (e.g. an editor grid).
    pub fn from_cells<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(idx, cells)| RawRow {
                    line: idx + 2,
                    cells: cells.iter().map(|c| c.as_ref().to_string()).collect(),
                })
                .collect(),
        }
    }

    /// Read a CSV table from any reader.
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read headers of '{source}': {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record =
                result.map_err(|e| AppError::new(2, format!("CSV parse error in '{source}': {e}")))?;
            // +2: records() starts after the header, and lines are 1-based.
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);
            rows.push(RawRow {
                line,
                cells: record.iter().map(str::to_string).collect(),
            });
        }

        Ok(Self { headers, rows })
    }

    /// Read a CSV table from disk.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
        Self::from_reader(file, &path.display().to_string())
    }

    fn header_map(&self) -> HashMap<String, usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect()
    }

    fn require_column(&self, header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
        header_map.get(name).copied().ok_or_else(|| {
            AppError::new(
                2,
                format!(
                    "Missing required column: `{name}` (found: {})",
                    self.headers.join(", ")
                ),
            )
        })
    }
}

/// A cell that could not be used, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedCell {
    pub line: usize,
    pub column: String,
    pub value: String,
    pub reason: CellError,
}

/// Cleaned rows plus every cell that was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned<T> {
    pub rows: Vec<T>,
    pub dropped: Vec<DroppedCell>,
}

impl<T> Cleaned<T> {
    /// Number of rows that lost at least one cell.
    pub fn dropped_rows(&self) -> usize {
        let mut lines: Vec<usize> = self.dropped.iter().map(|d| d.line).collect();
        lines.dedup();
        lines.len()
    }
}

/// One sample column of a wide release table.
#[derive(Debug, Clone, PartialEq)]
pub struct WideSample {
    pub label: String,
    pub readings: Cleaned<ReleaseReading>,
}

/// A wide release table split into samples.
#[derive(Debug, Clone, PartialEq)]
pub struct WideSplit {
    pub samples: Vec<WideSample>,
    /// Sample columns without a single numeric cell.
    pub skipped_columns: Vec<String>,
    /// Time cells that failed to parse (the whole row is dropped for every sample).
    pub dropped_times: Vec<DroppedCell>,
}

/// Parse one cell as a finite number.
pub fn parse_cell(value: &str) -> Result<f64, CellError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CellError::Blank);
    }
    let v = value.parse::<f64>().map_err(|_| CellError::NotNumeric)?;
    if v.is_finite() { Ok(v) } else { Err(CellError::NonFinite) }
}

/// Clean a calibration table with `concentration` and `absorbance` columns.
pub fn clean_calibration(table: &RawTable) -> Result<Cleaned<CalibrationPoint>, AppError> {
    let header_map = table.header_map();
    let c_idx = table.require_column(&header_map, "concentration")?;
    let a_idx = table.require_column(&header_map, "absorbance")?;

    let cleaned = clean_pairs(table, (c_idx, a_idx), |c, a| {
        if c < 0.0 {
            Err((0, CellError::NegativeConcentration))
        } else {
            Ok(CalibrationPoint::new(c, a))
        }
    });
    log_dropped("calibration", &cleaned.dropped);
    Ok(cleaned)
}

/// Clean a single-sample release table with `time` and `absorbance` columns.
pub fn clean_readings(table: &RawTable) -> Result<Cleaned<ReleaseReading>, AppError> {
    let header_map = table.header_map();
    let t_idx = table.require_column(&header_map, "time")?;
    let a_idx = table.require_column(&header_map, "absorbance")?;

    let cleaned = clean_pairs(table, (t_idx, a_idx), |t, a| Ok(ReleaseReading::new(t, a)));
    log_dropped("release", &cleaned.dropped);
    Ok(cleaned)
}

/// Split a wide release table: first column time, one absorbance column per sample.
///
/// Each sample column is checked up front: a column with no numeric cell at
/// all is skipped and listed, rather than failing later.
pub fn split_wide_table(table: &RawTable) -> Result<WideSplit, AppError> {
    if table.headers.len() < 2 {
        return Err(AppError::new(
            2,
            "A wide release table needs a time column followed by at least one sample column.",
        ));
    }
    let time_header = normalize_header_name(&table.headers[0]);
    if time_header != "time" {
        return Err(AppError::new(
            2,
            format!(
                "The first column of a wide release table must be time (found `{}`).",
                table.headers[0]
            ),
        ));
    }

    let rows: Vec<&RawRow> = table.rows.iter().filter(|r| !r.is_blank()).collect();

    let mut times: Vec<Option<f64>> = Vec::with_capacity(rows.len());
    let mut dropped_times = Vec::new();
    for row in &rows {
        match parse_cell(row.cell(0)) {
            Ok(t) => times.push(Some(t)),
            Err(reason) => {
                dropped_times.push(DroppedCell {
                    line: row.line,
                    column: table.headers[0].clone(),
                    value: row.cell(0).to_string(),
                    reason,
                });
                times.push(None);
            }
        }
    }

    let mut samples = Vec::new();
    let mut skipped_columns = Vec::new();

    for (col, header) in table.headers.iter().enumerate().skip(1) {
        let label = header.trim().trim_start_matches('\u{feff}').to_string();
        let numeric = rows.iter().any(|r| parse_cell(r.cell(col)).is_ok());
        if !numeric {
            skipped_columns.push(label);
            continue;
        }

        let mut readings = Vec::new();
        let mut dropped = Vec::new();
        for (row, time) in rows.iter().zip(&times) {
            let Some(time) = time else { continue };
            match parse_cell(row.cell(col)) {
                Ok(a) => readings.push(ReleaseReading::new(*time, a)),
                Err(reason) => dropped.push(DroppedCell {
                    line: row.line,
                    column: label.clone(),
                    value: row.cell(col).to_string(),
                    reason,
                }),
            }
        }
        log_dropped(&label, &dropped);
        samples.push(WideSample {
            label,
            readings: Cleaned {
                rows: readings,
                dropped,
            },
        });
    }

    if !skipped_columns.is_empty() {
        warn!("skipping non-numeric sample column(s): {}", skipped_columns.join(", "));
    }

    Ok(WideSplit {
        samples,
        skipped_columns,
        dropped_times,
    })
}

/// Normalize a header for matching: strip BOM, trim, lowercase, drop a `(unit)` suffix.
pub fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    let name = match name.find('(') {
        Some(idx) if name.ends_with(')') => name[..idx].trim(),
        _ => name,
    };
    name.to_lowercase()
}

fn clean_pairs<T>(
    table: &RawTable,
    (x_idx, y_idx): (usize, usize),
    build: impl Fn(f64, f64) -> Result<T, (usize, CellError)>,
) -> Cleaned<T> {
    let mut rows = Vec::new();
    let mut dropped = Vec::new();

    for row in table.rows.iter().filter(|r| !r.is_blank()) {
        let x = parse_cell(row.cell(x_idx));
        let y = parse_cell(row.cell(y_idx));

        let mut drop_cell = |idx: usize, reason: CellError| {
            dropped.push(DroppedCell {
                line: row.line,
                column: table.headers[idx].clone(),
                value: row.cell(idx).to_string(),
                reason,
            });
        };

        match (x, y) {
            (Ok(x), Ok(y)) => match build(x, y) {
                Ok(item) => rows.push(item),
                Err((which, reason)) => drop_cell(if which == 0 { x_idx } else { y_idx }, reason),
            },
            (x, y) => {
                if let Err(reason) = x {
                    drop_cell(x_idx, reason);
                }
                if let Err(reason) = y {
                    drop_cell(y_idx, reason);
                }
            }
        }
    }

    Cleaned { rows, dropped }
}

fn log_dropped(what: &str, dropped: &[DroppedCell]) {
    if !dropped.is_empty() {
        warn!("{what}: dropped {} unusable cell(s)", dropped.len());
    }
}
