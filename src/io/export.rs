//! Export per-sample release tables to CSV.
//!
//! One file per sample, named from the sample's 1-based position, with a fixed
//! column order so the files line up in spreadsheets.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::domain::ReleaseRecord;
use crate::error::AppError;
use crate::release::SampleRelease;

/// Export column order.
pub const RELEASE_COLUMNS: [&str; 5] = [
    "time",
    "absorbance",
    "concentration",
    "amount_released",
    "cumulative_release",
];

/// Deterministic file name for the sample at `ordinal` (1-based).
pub fn release_csv_file_name(ordinal: usize) -> String {
    format!("sample_{ordinal}_release.csv")
}

/// Write a release table as CSV (header always included, even for an empty table).
pub fn write_release_csv_to<W: Write>(writer: W, records: &[ReleaseRecord]) -> Result<(), AppError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(RELEASE_COLUMNS)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;
    for record in records {
        wtr.serialize(record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write a release table to a CSV file.
pub fn write_release_csv(path: &Path, records: &[ReleaseRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_release_csv_to(file, records)
}

/// Write one CSV per sample into `dir`, returning the paths in sample order.
///
/// Each release comes with its 1-based ordinal in the session's sample list,
/// so withheld samples leave a gap rather than shifting later file names.
pub fn export_releases<'a, I>(dir: &Path, releases: I) -> Result<Vec<PathBuf>, AppError>
where
    I: IntoIterator<Item = (usize, &'a SampleRelease)>,
{
    create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let mut paths = Vec::new();
    for (ordinal, release) in releases {
        let path = dir.join(release_csv_file_name(ordinal));
        write_release_csv(&path, &release.records)?;
        info!("exported '{}' to {}", release.label, path.display());
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_still_has_header() {
        let mut buf = Vec::new();
        write_release_csv_to(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "time,absorbance,concentration,amount_released,cumulative_release\n");
    }

    #[test]
    fn rows_follow_column_order() {
        let records = [ReleaseRecord {
            time: 4.0,
            absorbance: 0.01,
            concentration: 2.0,
            amount_released: 50.0,
            cumulative_release: 50.0,
        }];
        let mut buf = Vec::new();
        write_release_csv_to(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row, "4.0,0.01,2.0,50.0,50.0");
    }

    #[test]
    fn file_names_use_ordinal() {
        assert_eq!(release_csv_file_name(1), "sample_1_release.csv");
        assert_eq!(release_csv_file_name(9), "sample_9_release.csv");
    }
}
