//! Summary figure data and preview rendering.
//!
//! Nothing here draws axes. [`SummaryFigure`] holds the plotted series as
//! plain data (serialisable to JSON), and [`render_preview`] produces PNG
//! bytes of the example frame.

mod preview;


use serde::Serialize;

pub use preview::{example_preview, render_preview};

use crate::analysis::MovieAnalysis;

/// Bins per density histogram.
pub const HISTOGRAM_BINS: usize = 10;

/// Mean width at one timestamp with its ±1 std band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WidthPoint {
    pub time: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Normalised histogram of one frame's widths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub time: f64,
    /// Left edge of every bin.
    pub bin_edges: Vec<f64>,
    /// Density per bin, integrating to 1 over the bins.
    pub density: Vec<f64>,
}

/// Everything needed to draw the results figure: width over time (left
/// panel) and one density curve per frame (right panel).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryFigure {
    pub width_over_time: Vec<WidthPoint>,
    pub histograms: Vec<DensityCurve>,
}

impl SummaryFigure {
    /// Frames with an empty width distribution get no density curve.
    pub fn from_analysis(analysis: &MovieAnalysis) -> Self {
        let width_over_time = analysis
            .time_series
            .rows()
            .iter()
            .map(|row| WidthPoint {
                time: row.time,
                mean: row.bundle_mean,
                lower: row.bundle_mean - row.bundle_std,
                upper: row.bundle_mean + row.bundle_std,
            })
            .collect();

        let histograms = analysis
            .histograms
            .columns()
            .iter()
            .filter_map(|column| {
                let (bin_edges, density) = density_histogram(&column.widths, HISTOGRAM_BINS)?;
                Some(DensityCurve {
                    time: column.time,
                    bin_edges,
                    density,
                })
            })
            .collect();

        Self {
            width_over_time,
            histograms,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        common::serde::serialize(self, common::FileFormat::Json)
    }
}

/// Equal-width histogram over `[min, max]` of `values`, normalised to a
/// density. Returns `(left_edges, density)`, or `None` for empty input.
///
/// A zero range is widened to `[v - 0.5, v + 0.5]`. The last bin includes
/// its right edge.
pub fn density_histogram(values: &[f64], bins: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    if values.is_empty() || bins == 0 {
        return None;
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let bin_width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let bin = (((v - lo) / bin_width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    let norm = 1.0 / (values.len() as f64 * bin_width);
    let edges = (0..bins).map(|i| lo + i as f64 * bin_width).collect();
    let density = counts.iter().map(|&c| c as f64 * norm).collect();
    Some((edges, density))
}
