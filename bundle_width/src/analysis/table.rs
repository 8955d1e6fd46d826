//! Time-indexed result tables of a movie analysis.

use serde::Serialize;

use crate::peaks::{FrameStatistics, WidthDistribution};

/// One processed frame in the width-over-time table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesRow {
    pub time: f64,
    pub bundle_mean: f64,
    pub bundle_std: f64,
    pub bundle_sem: f64,
}

impl TimeSeriesRow {
    pub fn new(time: f64, statistics: &FrameStatistics) -> Self {
        Self {
            time,
            bundle_mean: statistics.mean,
            bundle_std: statistics.std,
            bundle_sem: statistics.sem,
        }
    }
}

/// Width statistics over time, one row per processed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeSeriesTable {
    rows: Vec<TimeSeriesRow>,
}

impl TimeSeriesTable {
    pub const COLUMNS: [&'static str; 4] = ["time", "bundle_mean", "bundle_std", "bundle_sem"];

    pub fn rows(&self) -> &[TimeSeriesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row.time)
    }

    pub(crate) fn push(&mut self, row: TimeSeriesRow) {
        debug_assert!(
            self.rows.last().is_none_or(|last| last.time <= row.time),
            "rows must be added in time order"
        );
        self.rows.push(row);
    }
}

/// Width distribution of one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramColumn {
    pub time: f64,
    pub widths: Vec<f64>,
}

/// Per-frame width distributions, kept ragged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistogramTable {
    columns: Vec<HistogramColumn>,
}

impl HistogramTable {
    pub fn columns(&self) -> &[HistogramColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Length of the longest distribution.
    pub fn max_len(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.widths.len())
            .max()
            .unwrap_or(0)
    }

    /// Row-major rectangular view: row `i` holds the `i`-th width of every
    /// frame, `None` where a frame has fewer widths.
    pub fn padded_rows(&self) -> Vec<Vec<Option<f64>>> {
        (0..self.max_len())
            .map(|i| {
                self.columns
                    .iter()
                    .map(|c| c.widths.get(i).copied())
                    .collect()
            })
            .collect()
    }

    pub(crate) fn push(&mut self, time: f64, distribution: WidthDistribution) {
        self.columns.push(HistogramColumn {
            time,
            widths: distribution.into_vec(),
        });
    }
}
