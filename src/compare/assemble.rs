//! Multi-sample comparison set.
//!
//! The set borrows each sample's release table rather than copying it, so the
//! member tables cannot change while a comparison built from them is alive.
//! Series keep their own time points: nothing is interpolated or aligned here.

use std::collections::HashMap;

use log::warn;

use crate::domain::ReleaseRecord;
use crate::error::ComparisonError;
use crate::release::SampleRelease;

/// One labelled cumulative-release series.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonSeries<'a> {
    pub label: &'a str,
    pub records: &'a [ReleaseRecord],
}

impl<'a> ComparisonSeries<'a> {
    /// `(time, cumulative_release)` pairs in entry order.
    pub fn points(self) -> impl Iterator<Item = (f64, f64)> + 'a {
        let records = self.records;
        records.iter().map(|r| (r.time, r.cumulative_release))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_released(&self) -> f64 {
        self.records.last().map(|r| r.cumulative_release).unwrap_or(0.0)
    }
}

/// Label-keyed set of release series, in input order.
#[derive(Debug, Clone)]
pub struct ComparisonSet<'a> {
    series: Vec<ComparisonSeries<'a>>,
    index: HashMap<&'a str, usize>,
}

impl<'a> ComparisonSet<'a> {
    pub fn get(&self, label: &str) -> Option<&ComparisonSeries<'a>> {
        self.index.get(label.trim()).map(|&i| &self.series[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComparisonSeries<'a>> {
        self.series.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.series.iter().map(|s| s.label)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Overall `(min, max)` time across all series, if any point exists.
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.series.iter().flat_map(|s| s.points().map(|(t, _)| t)))
    }

    /// Overall `(min, max)` cumulative release across all series.
    pub fn release_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.series.iter().flat_map(|s| s.points().map(|(_, y)| y)))
    }
}

/// Build a comparison set from `(label, records)` pairs.
///
/// Labels are compared after trimming surrounding whitespace. A repeated label
/// is rejected; nothing is renamed or merged.
pub fn assemble<'a, I>(samples: I) -> Result<ComparisonSet<'a>, ComparisonError>
where
    I: IntoIterator<Item = (&'a str, &'a [ReleaseRecord])>,
{
    let mut series = Vec::new();
    let mut index = HashMap::new();

    for (label, records) in samples {
        let label = label.trim();
        if index.contains_key(label) {
            warn!("duplicate sample label '{label}', comparison withheld");
            return Err(ComparisonError::DuplicateSampleLabel {
                label: label.to_string(),
            });
        }
        index.insert(label, series.len());
        series.push(ComparisonSeries { label, records });
    }

    Ok(ComparisonSet { series, index })
}

/// Convenience wrapper over computed sample releases.
pub fn assemble_releases<'a, I>(releases: I) -> Result<ComparisonSet<'a>, ComparisonError>
where
    I: IntoIterator<Item = &'a SampleRelease>,
{
    assemble(
        releases
            .into_iter()
            .map(|r| (r.label.as_str(), r.records.as_slice())),
    )
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    (min.is_finite() && max.is_finite()).then_some((min, max))
}
