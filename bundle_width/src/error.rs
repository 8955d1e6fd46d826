//! Error types for bundle width analysis.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Width, height and channel count of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameDimensions {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

/// Errors that can occur while loading, analyzing or exporting a movie.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Unsupported file extension: '{extension}'")]
    UnsupportedFormat { extension: String },

    #[error("Dimension mismatch for frame {index}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        index: usize,
        expected: FrameDimensions,
        actual: FrameDimensions,
    },

    #[error("Movie contains no frames")]
    EmptyStack,

    #[error("No frames selected: {total} frames, cutoff {cutoff:?}, stride {stride}")]
    EmptySelection {
        total: usize,
        cutoff: Option<usize>,
        stride: usize,
    },

    #[error("Failed to write '{path}': {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to render figure: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
