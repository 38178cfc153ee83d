//! Blank starting tables.
//!
//! A fresh session starts from a calibration table with the usual standard
//! concentrations and a wide release table with hourly time points and empty
//! sample columns, ready to be filled in a spreadsheet.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::MAX_SAMPLES;
use crate::error::AppError;

/// Standard concentrations (µg/mL) pre-filled in the calibration template.
pub const TEMPLATE_STANDARDS: [f64; 6] = [0.0, 10.0, 25.0, 50.0, 100.0, 200.0];

/// Number of time rows pre-filled in the release template.
pub const TEMPLATE_TIME_ROWS: usize = 10;

/// Write the calibration template.
pub fn write_calibration_template<W: Write>(writer: W) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let map = |e: csv::Error| AppError::new(2, format!("Failed to write calibration template: {e}"));

    wtr.write_record(["concentration", "absorbance"]).map_err(map)?;
    for c in TEMPLATE_STANDARDS {
        wtr.write_record([c.to_string(), String::new()]).map_err(map)?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush calibration template: {e}")))?;
    Ok(())
}

/// Write a wide release template with `samples` empty columns.
pub fn write_release_template<W: Write>(writer: W, samples: usize) -> Result<(), AppError> {
    if samples == 0 || samples > MAX_SAMPLES {
        return Err(AppError::new(
            2,
            format!("Template sample count must be in 1..={MAX_SAMPLES} (got {samples})."),
        ));
    }

    let mut wtr = csv::Writer::from_writer(writer);
    let map = |e: csv::Error| AppError::new(2, format!("Failed to write release template: {e}"));

    let mut header = vec!["Time (h)".to_string()];
    header.extend((1..=samples).map(|i| format!("Sample {i}")));
    wtr.write_record(&header).map_err(map)?;

    for t in 0..TEMPLATE_TIME_ROWS {
        let mut row = vec![t.to_string()];
        row.extend(std::iter::repeat_n(String::new(), samples));
        wtr.write_record(&row).map_err(map)?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush release template: {e}")))?;
    Ok(())
}

/// Write both templates into `dir` as `calibration.csv` and `release.csv`.
pub fn write_templates(dir: &Path, samples: usize) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create template dir '{}': {e}", dir.display())))?;

    let create = |name: &str| {
        let path = dir.join(name);
        File::create(&path)
            .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
    };

    write_calibration_template(create("calibration.csv")?)?;
    write_release_template(create("release.csv")?, samples)?;
    Ok(())
}
