//! Bundle width estimation for microscopy movies.
//!
//! Each analyzed frame is thresholded against its local neighbourhood,
//! despeckled, and turned into a Euclidean distance map. Ridge peaks of the
//! map sit on bundle centerlines, so twice their value (scaled by the pixel
//! size) is a bundle width. Per-frame width statistics are collected into a
//! time series and a table of per-frame width distributions.

pub mod analysis;
pub mod config;
pub mod distance_map;
pub mod error;
pub mod export;
pub mod movie;
pub mod peaks;
pub mod report;

pub use analysis::{
    FrameProgress, HistogramTable, MovieAnalysis, ProgressCallback, TimeSeriesRow,
    TimeSeriesTable, analyze, analyze_with_builder, select_frames,
};
pub use config::{AnalysisConfig, DistanceMapConfig, ThresholdMethod};
pub use distance_map::{DistanceMap, DistanceMapBuilder, build_distance_map};
pub use error::{Error, FrameDimensions, Result};
pub use export::{ExportPaths, export_tables};
pub use movie::{Frame, FrameStack};
pub use peaks::{FrameStatistics, WidthDistribution, WidthEstimate, extract};
pub use report::{SummaryFigure, example_preview, render_preview};
