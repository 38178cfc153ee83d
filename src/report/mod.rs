//! Reporting utilities: calibration summary, release tables, comparison ranking.

pub mod format;

pub use format::{
    format_advisories, format_calibration, format_comparison, format_release_table, format_run_summary,
    format_sample,
};
