//! Ridge peaks of a distance map and the bundle widths they imply.
//!
//! Every row and every column of the distance map is scanned for strict
//! local maxima (greater than both immediate neighbours). A ridge peak sits
//! on a bundle's centerline, so its value is the half-width in pixels.
//! Row and column hits are concatenated without deduplication.


use common::Buffer2;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::validate_pixel_size;
use crate::error::Result;

// ============================================================================
// Peak scanning
// ============================================================================

/// Values of `line` that are strictly greater than both immediate neighbours.
///
/// Endpoints are never maxima and plateaus produce no peak.
pub fn strict_local_maxima(line: &[f64]) -> Vec<f64> {
    line.windows(3)
        .filter(|w| w[1] > w[0] && w[1] > w[2])
        .map(|w| w[1])
        .collect()
}

/// Ridge values of every row (top to bottom) followed by every column
/// (left to right).
pub fn collect_peaks(distance: &Buffer2<f64>) -> Vec<f64> {
    let row_peaks: Vec<Vec<f64>> = (0..distance.height())
        .into_par_iter()
        .map(|y| strict_local_maxima(distance.row(y)))
        .collect();

    let columns = distance.transposed();
    let column_peaks: Vec<Vec<f64>> = (0..columns.height())
        .into_par_iter()
        .map(|x| strict_local_maxima(columns.row(x)))
        .collect();

    row_peaks.into_iter().chain(column_peaks).flatten().collect()
}

// ============================================================================
// Widths and statistics
// ============================================================================

/// Bundle widths of one frame in physical units.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WidthDistribution {
    widths: Vec<f64>,
}

impl WidthDistribution {
    /// Drops NaN peaks and converts half-widths in pixels to full widths:
    /// `peak * pixel_size * 2`.
    pub fn from_peaks(peaks: &[f64], pixel_size: f64) -> Self {
        let widths = peaks
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| v * pixel_size * 2.0)
            .collect();
        Self { widths }
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.widths
    }

    pub fn statistics(&self) -> FrameStatistics {
        FrameStatistics::from_values(&self.widths)
    }
}

/// Summary of one frame's width distribution.
///
/// An empty distribution has `count == 0` and NaN for every moment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameStatistics {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Standard error of the mean, `std / sqrt(count)`.
    pub sem: f64,
    pub count: usize,
}

impl FrameStatistics {
    pub const EMPTY: Self = Self {
        mean: f64::NAN,
        std: f64::NAN,
        sem: f64::NAN,
        count: 0,
    };

    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::EMPTY;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std = variance.sqrt();
        Self {
            mean,
            std,
            sem: std / n.sqrt(),
            count: values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Result of [`extract`] for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WidthEstimate {
    pub statistics: FrameStatistics,
    pub distribution: WidthDistribution,
}

impl WidthEstimate {
    pub fn mean(&self) -> f64 {
        self.statistics.mean
    }

    pub fn std(&self) -> f64 {
        self.statistics.std
    }
}

/// Converts the ridge peaks of `distance` into a width distribution with
/// its mean and population standard deviation.
pub fn extract(distance: &Buffer2<f64>, pixel_size: f64) -> Result<WidthEstimate> {
    validate_pixel_size(pixel_size)?;

    let peaks = collect_peaks(distance);
    let distribution = WidthDistribution::from_peaks(&peaks, pixel_size);
    let statistics = distribution.statistics();

    if statistics.is_empty() {
        tracing::debug!(
            width = distance.width(),
            height = distance.height(),
            "No ridge peaks in distance map"
        );
    }

    Ok(WidthEstimate {
        statistics,
        distribution,
    })
}
