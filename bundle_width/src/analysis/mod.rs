//! Whole-movie bundle width analysis.
//!
//! The movie is truncated at `cutoff`, subsampled every `stride` frames, and
//! each retained frame runs through the distance map builder and the peak
//! extractor. Frames are independent and processed in parallel with a bound
//! on how many are in flight; results keep selection order.

mod progress;
mod table;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::parallel::try_par_map_limited;

pub use progress::{FrameProgress, ProgressCallback};
pub use table::{HistogramColumn, HistogramTable, TimeSeriesRow, TimeSeriesTable};

use crate::config::AnalysisConfig;
use crate::distance_map::{AdaptiveThreshold, DistanceMapBuilder, DistanceTransform, MedianFilter};
use crate::error::{Error, Result};
use crate::movie::FrameStack;
use crate::peaks::{self, WidthEstimate};

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq)]
pub struct MovieAnalysis {
    pub time_series: TimeSeriesTable,
    pub histograms: HistogramTable,
    /// Movie index of every processed frame, in table order.
    pub frame_indices: Vec<usize>,
}

impl MovieAnalysis {
    /// Movie index of the middle processed frame.
    pub fn example_frame_index(&self) -> Option<usize> {
        self.frame_indices.get(self.frame_indices.len() / 2).copied()
    }
}

/// Indices of the frames to analyze: `[0, cutoff)` clamped to `total`, then
/// every `stride`-th frame starting at 0.
pub fn select_frames(total: usize, cutoff: Option<usize>, stride: usize) -> Result<Vec<usize>> {
    if stride == 0 {
        return Err(Error::invalid("stride", "must be >= 1, got 0"));
    }
    let end = cutoff.map_or(total, |c| c.min(total));
    let selected: Vec<usize> = (0..end).step_by(stride).collect();
    if selected.is_empty() {
        return Err(Error::EmptySelection {
            total,
            cutoff,
            stride,
        });
    }
    Ok(selected)
}

/// Analyzes `stack` with the default distance map backends.
pub fn analyze(
    stack: &FrameStack,
    config: &AnalysisConfig,
    progress: &ProgressCallback,
) -> Result<MovieAnalysis> {
    let builder = DistanceMapBuilder::new(config.distance_map)?;
    analyze_with_builder(stack, config, &builder, progress)
}

/// Analyzes `stack` using `builder` for every frame.
///
/// `config.distance_map` is validated but the builder's own configuration is
/// what shapes the distance maps.
pub fn analyze_with_builder<T, M, D>(
    stack: &FrameStack,
    config: &AnalysisConfig,
    builder: &DistanceMapBuilder<T, M, D>,
    progress: &ProgressCallback,
) -> Result<MovieAnalysis>
where
    T: AdaptiveThreshold,
    M: MedianFilter,
    D: DistanceTransform,
{
    config.validate()?;
    let frame_indices = select_frames(stack.len(), config.cutoff, config.stride)?;
    let total = frame_indices.len();

    tracing::info!(
        frames = stack.len(),
        selected = total,
        stride = config.stride,
        cutoff = ?config.cutoff,
        max_concurrent = config.max_concurrent_frames,
        "Analyzing movie"
    );

    let completed = AtomicUsize::new(0);
    let estimates = try_par_map_limited(&frame_indices, config.max_concurrent_frames, |&index| {
        let estimate = analyze_frame(stack, index, builder, config.pixel_size)?;
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        progress.call(FrameProgress {
            completed: done,
            total,
            frame_index: index,
        });
        Ok(estimate)
    })?;

    let mut time_series = TimeSeriesTable::default();
    let mut histograms = HistogramTable::default();
    for (position, estimate) in estimates.into_iter().enumerate() {
        let time = position as f64 * config.time_per_frame * config.stride as f64;
        time_series.push(TimeSeriesRow::new(time, &estimate.statistics));
        histograms.push(time, estimate.distribution);
    }

    let degenerate = time_series
        .rows()
        .iter()
        .filter(|row| row.bundle_mean.is_nan())
        .count();
    tracing::info!(processed = total, degenerate, "Movie analysis complete");

    Ok(MovieAnalysis {
        time_series,
        histograms,
        frame_indices,
    })
}

fn analyze_frame<T, M, D>(
    stack: &FrameStack,
    index: usize,
    builder: &DistanceMapBuilder<T, M, D>,
    pixel_size: f64,
) -> Result<WidthEstimate>
where
    T: AdaptiveThreshold,
    M: MedianFilter,
    D: DistanceTransform,
{
    let image = stack.frame(index).to_grayscale();
    let map = builder.build(&image)?;
    let estimate = peaks::extract(&map.distance, pixel_size)?;

    if estimate.statistics.is_empty() {
        tracing::warn!(frame = index, "No ridge peaks found, width statistics are NaN");
    } else {
        tracing::debug!(
            frame = index,
            peaks = estimate.statistics.count,
            mean = estimate.mean(),
            std = estimate.std(),
            "Frame analyzed"
        );
    }
    Ok(estimate)
}
