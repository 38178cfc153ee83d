//! Per-series release metrics and ranking.
//!
//! These answer the questions a comparison is usually read for: which sample
//! released fastest, and which showed a burst (a large share released by the
//! first sampling time).

use serde::{Deserialize, Serialize};

use crate::compare::{ComparisonSeries, ComparisonSet};

/// Summary metrics for one release series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub label: String,
    pub n_points: usize,
    /// Final cumulative release (µg).
    pub total_released: f64,
    /// Share of the total released by the first time point after t = 0.
    pub burst_fraction: Option<f64>,
    /// Time at which half of the sample's own total was reached (interpolated).
    pub time_to_half: Option<f64>,
}

/// Compute summaries for every series, in set order.
pub fn summarize(set: &ComparisonSet<'_>) -> Vec<SeriesSummary> {
    set.iter().map(|s| summarize_series(*s)).collect()
}

pub fn summarize_series(series: ComparisonSeries<'_>) -> SeriesSummary {
    let total = series.total_released();
    SeriesSummary {
        label: series.label.to_string(),
        n_points: series.records.len(),
        total_released: total,
        burst_fraction: burst_fraction(series, total),
        time_to_half: time_to_fraction(series, total, 0.5),
    }
}

/// Order summaries fastest first (shortest time to half release).
///
/// Series that never release anything sort last, keeping their input order.
pub fn rank_by_release_rate(summaries: &[SeriesSummary]) -> Vec<SeriesSummary> {
    let mut sorted = summaries.to_vec();
    sorted.sort_by(|a, b| match (a.time_to_half, b.time_to_half) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    sorted
}

fn burst_fraction(series: ComparisonSeries<'_>, total: f64) -> Option<f64> {
    if total <= 0.0 {
        return None;
    }
    let first = series.records.iter().find(|r| r.time > 0.0)?;
    Some(first.cumulative_release / total)
}

fn time_to_fraction(series: ComparisonSeries<'_>, total: f64, fraction: f64) -> Option<f64> {
    if total <= 0.0 {
        return None;
    }
    let target = total * fraction;

    let mut prev: Option<(f64, f64)> = None;
    for (t, c) in series.points() {
        if c >= target {
            return Some(match prev {
                Some((t0, c0)) if c > c0 => t0 + (target - c0) / (c - c0) * (t - t0),
                _ => t,
            });
        }
        prev = Some((t, c));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::assemble;
    use crate::domain::ReleaseRecord;

    fn series(points: &[(f64, f64)]) -> Vec<ReleaseRecord> {
        points
            .iter()
            .map(|&(time, cumulative_release)| ReleaseRecord {
                time,
                absorbance: 0.0,
                concentration: 0.0,
                amount_released: 0.0,
                cumulative_release,
            })
            .collect()
    }

    #[test]
    fn interpolates_time_to_half() {
        let a = series(&[(0.0, 0.0), (2.0, 40.0), (4.0, 80.0), (8.0, 100.0)]);
        let set = assemble([("A", a.as_slice())]).unwrap();
        let s = &summarize(&set)[0];
        assert_eq!(s.total_released, 100.0);
        // 50 lies between 40 (t=2) and 80 (t=4).
        assert!((s.time_to_half.unwrap() - 2.5).abs() < 1e-12);
        assert!((s.burst_fraction.unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn nothing_released_has_no_metrics() {
        let a = series(&[(0.0, 0.0), (1.0, 0.0)]);
        let set = assemble([("flat", a.as_slice())]).unwrap();
        let s = &summarize(&set)[0];
        assert!(s.time_to_half.is_none());
        assert!(s.burst_fraction.is_none());
    }

    #[test]
    fn ranks_fastest_first() {
        let slow = series(&[(0.0, 0.0), (10.0, 10.0)]);
        let fast = series(&[(0.0, 0.0), (1.0, 9.0), (10.0, 10.0)]);
        let none = series(&[(0.0, 0.0)]);
        let set = assemble([
            ("slow", slow.as_slice()),
            ("none", none.as_slice()),
            ("fast", fast.as_slice()),
        ])
        .unwrap();
        let ranked = rank_by_release_rate(&summarize(&set));
        let labels: Vec<_> = ranked.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["fast", "slow", "none"]);
    }
}
