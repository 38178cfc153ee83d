//! Formatted terminal output for a session.
//!
//! We keep formatting code in one place so:
//! - the calibration/release code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::{SampleResult, SessionOutput};
use crate::compare::{SeriesSummary, rank_by_release_rate};
use crate::domain::{CalibrationModel, ReleaseRecord};

/// Format the calibration block (equation, r², standards used).
pub fn format_calibration(model: &CalibrationModel) -> String {
    let mut out = String::new();

    out.push_str("Calibration:\n");
    out.push_str(&format!("- equation: {}\n", model.equation()));
    match model.r_squared {
        Some(r2) => out.push_str(&format!("- r2: {r2:.5}\n")),
        None => out.push_str("- r2: n/a (fallback, not fitted)\n"),
    }
    out.push_str(&format!("- standards used: {}\n", model.n_points));
    if let Some(range) = model.standards {
        out.push_str(&format!(
            "- range: [{:.2}, {:.2}] ug/mL\n",
            range.min, range.max
        ));
    }

    out
}

/// Format the full run summary (calibration + per-sample tables).
pub fn format_run_summary(output: &SessionOutput) -> String {
    let mut out = String::new();

    out.push_str("=== release - Drug Release Analysis ===\n");
    out.push_str(&format!(
        "Sample volume: {} mL | samples: {}\n\n",
        output.config.sample_volume,
        output.samples.len()
    ));
    out.push_str(&format_calibration(&output.calibration.model));

    for sample in &output.samples {
        out.push('\n');
        out.push_str(&format_sample(sample));
    }

    out
}

/// Format one sample's release table, or the reason it was withheld.
pub fn format_sample(sample: &SampleResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Sample {}: {}\n", sample.ordinal, sample.label));
    match &sample.outcome {
        Ok(release) => {
            out.push_str(&format_release_table(&release.records));
            out.push_str(&format!("Total released: {:.2} ug\n", release.total_released()));
        }
        Err(reason) => out.push_str(&format!("(withheld) {reason}\n")),
    }
    out
}

/// Format a release table in entry order.
pub fn format_release_table(records: &[ReleaseRecord]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:>10} {:>12} {:>14} {:>14} {:>14}",
            "time_h", "absorbance", "conc_ug_ml", "released_ug", "cumulative_ug"
        ),
    );
    push_line(
        &mut out,
        format!("{:-<10} {:-<12} {:-<14} {:-<14} {:-<14}", "", "", "", "", ""),
    );

    if records.is_empty() {
        out.push_str("(no readings)\n");
        return out;
    }
    for r in records {
        push_line(
            &mut out,
            format!(
                "{:>10.2} {:>12.4} {:>14.3} {:>14.2} {:>14.2}",
                r.time, r.absorbance, r.concentration, r.amount_released, r.cumulative_release
            ),
        );
    }
    out
}

/// Format per-series metrics followed by the release-rate ranking.
pub fn format_comparison(summaries: &[SeriesSummary]) -> String {
    let mut out = String::new();

    out.push_str("Comparison:\n");
    push_line(
        &mut out,
        format!(
            "{:<24} {:>6} {:>14} {:>8} {:>10}",
            "sample", "n", "total_ug", "burst", "t50_h"
        ),
    );
    push_line(
        &mut out,
        format!("{:-<24} {:-<6} {:-<14} {:-<8} {:-<10}", "", "", "", "", ""),
    );
    for s in summaries {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>6} {:>14.2} {:>8} {:>10}",
                truncate(&s.label, 24),
                s.n_points,
                s.total_released,
                fmt_opt(s.burst_fraction.map(|b| b * 100.0), "%"),
                fmt_opt(s.time_to_half, ""),
            ),
        );
    }

    let ranked = rank_by_release_rate(summaries);
    if !ranked.is_empty() {
        out.push_str("\nFastest release first (by t50):\n");
        for (idx, s) in ranked.iter().enumerate() {
            out.push_str(&format!("{:>2}. {}\n", idx + 1, s.label));
        }
    }

    out
}

/// Format the advisories block; empty when there is nothing to say.
pub fn format_advisories<T: std::fmt::Display>(advisories: &[T]) -> String {
    if advisories.is_empty() {
        return String::new();
    }
    let mut out = String::from("Advisories:\n");
    for a in advisories {
        out.push_str(&format!("! {a}\n"));
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_opt(v: Option<f64>, unit: &str) -> String {
    match v {
        Some(x) => format!("{x:.1}{unit}"),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelSource, StandardsRange};

    #[test]
    fn calibration_block_shows_equation_and_r2() {
        let model = CalibrationModel {
            slope: 0.005,
            intercept: -0.01,
            r_squared: Some(0.99876),
            n_points: 6,
            source: ModelSource::Fitted,
            standards: Some(StandardsRange { min: 0.0, max: 200.0 }),
        };
        let txt = format_calibration(&model);
        assert!(txt.contains("A = 0.005000·C - 0.010000"));
        assert!(txt.contains("- r2: 0.99876"));
        assert!(txt.contains("- range: [0.00, 200.00] ug/mL"));
    }

    #[test]
    fn fallback_has_no_r2() {
        let txt = format_calibration(&CalibrationModel::fallback());
        assert!(txt.contains("n/a"));
    }

    #[test]
    fn release_table_rows_are_right_aligned() {
        let records = [ReleaseRecord {
            time: 1.0,
            absorbance: 0.05,
            concentration: 10.0,
            amount_released: 250.0,
            cumulative_release: 250.0,
        }];
        let txt = format_release_table(&records);
        let rows: Vec<&str> = txt.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[2],
            "      1.00       0.0500         10.000         250.00         250.00"
        );
    }

    #[test]
    fn comparison_ranks_fastest_first() {
        let summaries = vec![
            SeriesSummary {
                label: "slow".to_string(),
                n_points: 3,
                total_released: 100.0,
                burst_fraction: Some(0.1),
                time_to_half: Some(8.0),
            },
            SeriesSummary {
                label: "fast".to_string(),
                n_points: 3,
                total_released: 100.0,
                burst_fraction: None,
                time_to_half: Some(1.5),
            },
        ];
        let txt = format_comparison(&summaries);
        assert!(txt.contains(" 1. fast\n 2. slow\n"));
        assert!(txt.contains("10.0%"));
    }

    #[test]
    fn truncate_marks_cut_labels() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
