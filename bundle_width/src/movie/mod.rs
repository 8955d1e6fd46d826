//! Movie frames and their grayscale view.

mod load;


use std::path::Path;

use common::Buffer2;

pub use crate::error::FrameDimensions;
use crate::error::{Error, Result};

/// Luminance weights (ITU-R BT.709) used to collapse RGB to a single channel.
pub const LUMINANCE_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// One movie frame with interleaved channel samples.
///
/// 1 channel = L, 2 = LA, 3 = RGB, 4 = RGBA. Samples keep the units of the
/// source file: TIFF pages hold raw sample values (e.g. 0..65535 for 16-bit),
/// PNG and JPEG frames are scaled to [0, 1]. A non-zero threshold offset is
/// expressed in those units.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    dimensions: FrameDimensions,
    pixels: Vec<f32>,
}

impl Frame {
    pub fn new(dimensions: FrameDimensions, pixels: Vec<f32>) -> Result<Self> {
        validate_layout(dimensions, pixels.len())?;
        Ok(Self { dimensions, pixels })
    }

    /// Single-channel frame from a grid of intensities.
    pub fn from_gray(image: Buffer2<f32>) -> Self {
        let dimensions = FrameDimensions {
            width: image.width(),
            height: image.height(),
            channels: 1,
        };
        Self {
            dimensions,
            pixels: image.into_vec(),
        }
    }

    pub fn dimensions(&self) -> FrameDimensions {
        self.dimensions
    }

    /// Interleaved samples, row-major.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    pub fn width(&self) -> usize {
        self.dimensions.width
    }

    pub fn height(&self) -> usize {
        self.dimensions.height
    }

    /// Single-channel intensity. RGB is weighted by [`LUMINANCE_WEIGHTS`].
    /// Alpha is dropped, not composited onto a background, so transparent
    /// pixels keep their colour's luminance.
    pub fn to_grayscale(&self) -> Buffer2<f32> {
        let FrameDimensions {
            width,
            height,
            channels,
        } = self.dimensions;

        let gray = match channels {
            1 => self.pixels.clone(),
            2 => self.pixels.chunks_exact(2).map(|la| la[0]).collect(),
            _ => self
                .pixels
                .chunks_exact(channels)
                .map(|px| {
                    LUMINANCE_WEIGHTS[0] * px[0]
                        + LUMINANCE_WEIGHTS[1] * px[1]
                        + LUMINANCE_WEIGHTS[2] * px[2]
                })
                .collect(),
        };

        Buffer2::new(width, height, gray)
    }
}

/// Ordered frames of one movie, all with identical dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn from_frames(frames: Vec<Frame>) -> Result<Self> {
        let Some(first) = frames.first() else {
            return Err(Error::EmptyStack);
        };
        let expected = first.dimensions;
        for (index, frame) in frames.iter().enumerate() {
            validate_layout(frame.dimensions, frame.pixels.len()).map_err(|e| match e {
                Error::InvalidParameter { reason, .. } => {
                    Error::invalid("frame", format!("frame {index}: {reason}"))
                }
                other => other,
            })?;
            if frame.dimensions != expected {
                return Err(Error::DimensionMismatch {
                    index,
                    expected,
                    actual: frame.dimensions,
                });
            }
        }
        Ok(Self { frames })
    }

    /// Loads every frame of a movie file.
    ///
    /// `.tif`/`.tiff` files yield one frame per page; `.png`, `.jpg` and
    /// `.jpeg` yield a single frame.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let frames = load::load_frames(path)?;
        let stack = Self::from_frames(frames)?;
        tracing::info!(
            path = %path.display(),
            frames = stack.len(),
            width = stack.dimensions().width,
            height = stack.dimensions().height,
            channels = stack.dimensions().channels,
            "Loaded movie"
        );
        Ok(stack)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn dimensions(&self) -> FrameDimensions {
        self.frames[0].dimensions
    }

    pub fn frame(&self, index: usize) -> &Frame {
        &self.frames[index]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

/// Checks that `len` samples exactly fill a frame of `dimensions` with 1 to 4
/// channels.
fn validate_layout(dimensions: FrameDimensions, len: usize) -> Result<()> {
    let FrameDimensions {
        width,
        height,
        channels,
    } = dimensions;
    if width == 0 || height == 0 {
        return Err(Error::invalid(
            "frame",
            format!("dimensions must be non-zero, got {width}x{height}"),
        ));
    }
    if !(1..=4).contains(&channels) {
        return Err(Error::invalid(
            "frame",
            format!("expected 1 to 4 channels, got {channels}"),
        ));
    }
    if len != width * height * channels {
        return Err(Error::invalid(
            "frame",
            format!("{len} samples do not fill {width}x{height}x{channels}"),
        ));
    }
    Ok(())
}
