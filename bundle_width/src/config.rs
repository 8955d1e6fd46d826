//! Configuration types for bundle width analysis.
//!
//! [`AnalysisConfig`] carries the movie-level parameters (timing, frame
//! selection, calibration) and a nested [`DistanceMapConfig`] for the
//! per-frame preprocessing. Every field has a default so partial YAML/JSON
//! files are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Distance map
// ============================================================================

/// How the local threshold of each pixel is derived from its neighbourhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Gaussian-weighted mean with `sigma = (block_size - 1) / 6`.
    #[default]
    Gaussian,
    /// Unweighted mean over a `block_size x block_size` box.
    Mean,
}

/// Parameters of the threshold → despeckle → distance transform stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceMapConfig {
    /// Neighbourhood size for the adaptive threshold. Odd, at least 3.
    pub threshold_block_size: usize,
    /// Window size of the median filter applied to the binary mask.
    pub denoise_level: usize,
    pub threshold_method: ThresholdMethod,
    /// Subtracted from the local threshold before comparison.
    pub threshold_offset: f32,
}

impl Default for DistanceMapConfig {
    fn default() -> Self {
        Self {
            threshold_block_size: 21,
            denoise_level: 9,
            threshold_method: ThresholdMethod::Gaussian,
            threshold_offset: 0.0,
        }
    }
}

impl DistanceMapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold_block_size < 3 || self.threshold_block_size % 2 == 0 {
            return Err(Error::invalid(
                "threshold_block_size",
                format!(
                    "must be an odd number >= 3, got {}",
                    self.threshold_block_size
                ),
            ));
        }
        if self.denoise_level == 0 {
            return Err(Error::invalid("denoise_level", "must be >= 1, got 0"));
        }
        if !self.threshold_offset.is_finite() {
            return Err(Error::invalid(
                "threshold_offset",
                format!("must be finite, got {}", self.threshold_offset),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Movie analysis
// ============================================================================

/// Parameters of a whole-movie analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Seconds between consecutive frames of the movie.
    pub time_per_frame: f64,
    /// Analyze frames `[0, cutoff)` only. `None` keeps every frame.
    pub cutoff: Option<usize>,
    /// Analyze every `stride`-th frame of the truncated movie.
    pub stride: usize,
    /// Physical size of one pixel (e.g. microns).
    pub pixel_size: f64,
    /// Upper bound on frames processed at once.
    pub max_concurrent_frames: usize,
    pub distance_map: DistanceMapConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            time_per_frame: 1.0,
            cutoff: None,
            stride: 10,
            pixel_size: 1.0,
            max_concurrent_frames: common::parallel::available_concurrency(),
            distance_map: DistanceMapConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            return Err(Error::invalid("stride", "must be >= 1, got 0"));
        }
        if !self.time_per_frame.is_finite() || self.time_per_frame < 0.0 {
            return Err(Error::invalid(
                "time_per_frame",
                format!("must be finite and >= 0, got {}", self.time_per_frame),
            ));
        }
        validate_pixel_size(self.pixel_size)?;
        if self.max_concurrent_frames == 0 {
            return Err(Error::invalid(
                "max_concurrent_frames",
                "must be >= 1, got 0",
            ));
        }
        self.distance_map.validate()
    }

    /// Loads a YAML or JSON config, chosen by file extension.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let format = common::FileFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;
        let config: Self = common::serde::deserialize(&bytes, format)?;
        Ok(config)
    }
}

pub(crate) fn validate_pixel_size(pixel_size: f64) -> Result<()> {
    if !pixel_size.is_finite() || pixel_size <= 0.0 {
        return Err(Error::invalid(
            "pixel_size",
            format!("must be finite and > 0, got {pixel_size}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stride, 10);
        assert_eq!(config.cutoff, None);
        assert_eq!(config.distance_map.threshold_block_size, 21);
        assert_eq!(config.distance_map.denoise_level, 9);
        assert!(config.max_concurrent_frames >= 1);
    }

    #[test]
    fn test_even_block_size_rejected() {
        let config = DistanceMapConfig {
            threshold_block_size: 20,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "threshold_block_size",
                ..
            }
        ));
    }

    #[test]
    fn test_block_size_below_three_rejected() {
        let config = DistanceMapConfig {
            threshold_block_size: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_stride_rejected() {
        let config = AnalysisConfig {
            stride: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn test_non_positive_pixel_size_rejected() {
        for pixel_size in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = AnalysisConfig {
                pixel_size,
                ..Default::default()
            };
            assert!(
                config.validate().is_err(),
                "pixel_size {pixel_size} should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_denoise_level_rejected() {
        let config = AnalysisConfig {
            distance_map: DistanceMapConfig {
                denoise_level: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = b"stride: 5\npixel_size: 0.065\ndistance_map:\n  threshold_method: mean\n";
        let config: AnalysisConfig =
            common::serde::deserialize(yaml, common::FileFormat::Yaml).unwrap();
        assert_eq!(config.stride, 5);
        assert_eq!(config.pixel_size, 0.065);
        assert_eq!(config.time_per_frame, 1.0);
        assert_eq!(config.distance_map.threshold_method, ThresholdMethod::Mean);
        assert_eq!(config.distance_map.threshold_block_size, 21);
    }

    #[test]
    fn test_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.json");
        std::fs::write(&path, r#"{ "time_per_frame": 2.5, "cutoff": 40 }"#).unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.time_per_frame, 2.5);
        assert_eq!(config.cutoff, Some(40));
        assert_eq!(config.stride, 10);
    }

    #[test]
    fn test_from_file_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.ini");
        std::fs::write(&path, "stride = 3").unwrap();
        assert!(AnalysisConfig::from_file(&path).is_err());
    }
}
