//! Binary mask and Euclidean distance map of a single frame.
//!
//! The stage runs three steps, each behind a narrow trait so the numeric
//! backend can be swapped:
//! 1. [`AdaptiveThreshold`]: per-pixel local threshold map
//! 2. [`MedianFilter`]: despeckle of the thresholded mask
//! 3. [`DistanceTransform`]: distance of every foreground cell to the
//!    nearest background cell
//!
//! [`DistanceMapBuilder`] wires the default backends together.

mod edt;
mod median;
mod threshold;


use common::Buffer2;

pub use edt::ExactEuclideanTransform;
pub use median::MajorityMedianFilter;
pub use threshold::{LocalThreshold, reflect_index};

use crate::config::DistanceMapConfig;
use crate::error::{Error, Result};

// ============================================================================
// Backend traits
// ============================================================================

/// Computes a local threshold for every pixel from a `block_size`
/// neighbourhood, minus `offset`.
pub trait AdaptiveThreshold: Send + Sync {
    fn threshold_map(&self, image: &Buffer2<f32>, block_size: usize, offset: f32) -> Buffer2<f32>;
}

/// Median filter over a `size x size` window of a binary mask.
pub trait MedianFilter: Send + Sync {
    fn filter(&self, mask: &Buffer2<bool>, size: usize) -> Buffer2<bool>;
}

/// Distance of every `true` cell to the nearest `false` cell; `false`
/// cells map to 0.
pub trait DistanceTransform: Send + Sync {
    fn transform(&self, mask: &Buffer2<bool>) -> Buffer2<f64>;
}

// ============================================================================
// Builder
// ============================================================================

/// Output of [`DistanceMapBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMap {
    /// Euclidean distance to the nearest background cell, in pixels.
    pub distance: Buffer2<f64>,
    /// Denoised foreground mask the distances were computed on.
    pub mask: Buffer2<bool>,
}

/// Threshold → despeckle → distance transform over one grayscale image.
#[derive(Debug, Clone)]
pub struct DistanceMapBuilder<
    T = LocalThreshold,
    M = MajorityMedianFilter,
    D = ExactEuclideanTransform,
> {
    config: DistanceMapConfig,
    threshold: T,
    median: M,
    transform: D,
}

impl DistanceMapBuilder {
    /// Builder with the default backends for `config`.
    pub fn new(config: DistanceMapConfig) -> Result<Self> {
        let threshold = LocalThreshold::new(config.threshold_method);
        Self::with_backends(
            config,
            threshold,
            MajorityMedianFilter,
            ExactEuclideanTransform,
        )
    }
}

impl<T, M, D> DistanceMapBuilder<T, M, D>
where
    T: AdaptiveThreshold,
    M: MedianFilter,
    D: DistanceTransform,
{
    pub fn with_backends(
        config: DistanceMapConfig,
        threshold: T,
        median: M,
        transform: D,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            threshold,
            median,
            transform,
        })
    }

    pub fn config(&self) -> &DistanceMapConfig {
        &self.config
    }

    /// Computes the denoised foreground mask of `image` and its distance map.
    ///
    /// Foreground = brighter than the local threshold. A frame without any
    /// background cell yields an all-zero distance map.
    pub fn build(&self, image: &Buffer2<f32>) -> Result<DistanceMap> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::invalid(
                "image",
                format!(
                    "must not be empty, got {}x{}",
                    image.width(),
                    image.height()
                ),
            ));
        }

        let thresholds = self.threshold.threshold_map(
            image,
            self.config.threshold_block_size,
            self.config.threshold_offset,
        );
        debug_assert!(thresholds.same_shape(image));

        let raw_mask = Buffer2::new(
            image.width(),
            image.height(),
            image
                .iter()
                .zip(thresholds.iter())
                .map(|(&value, &threshold)| value > threshold)
                .collect(),
        );

        let mask = self.median.filter(&raw_mask, self.config.denoise_level);
        let distance = self.transform.transform(&mask);

        Ok(DistanceMap { distance, mask })
    }
}

/// Builds the distance map of `image` with default backends and a zero
/// threshold offset.
pub fn build_distance_map(
    image: &Buffer2<f32>,
    threshold_block_size: usize,
    denoise_level: usize,
) -> Result<DistanceMap> {
    let config = DistanceMapConfig {
        threshold_block_size,
        denoise_level,
        ..Default::default()
    };
    DistanceMapBuilder::new(config)?.build(image)
}
