//! Tests for table export.

use common::Buffer2;

use super::*;
use crate::analysis::{ProgressCallback, analyze};
use crate::config::{AnalysisConfig, DistanceMapConfig};
use crate::movie::{Frame, FrameStack};
use crate::peaks::WidthDistribution;

fn sample_analysis() -> MovieAnalysis {
    let bars = |bar: usize| {
        Frame::from_gray(Buffer2::from_fn(16, 48, move |_, y| {
            if y % (bar + 9) >= 9 { 200.0 } else { 10.0 }
        }))
    };
    let frames = vec![
        bars(5),
        Frame::from_gray(Buffer2::new_filled(16, 48, 3.0)),
        bars(7),
    ];
    let stack = FrameStack::from_frames(frames).unwrap();
    let config = AnalysisConfig {
        stride: 1,
        time_per_frame: 2.5,
        distance_map: DistanceMapConfig {
            denoise_level: 3,
            ..Default::default()
        },
        ..Default::default()
    };
    analyze(&stack, &config, &ProgressCallback::default()).unwrap()
}

#[test]
fn test_sibling_paths_use_movie_stem() {
    let paths = ExportPaths::for_movie(Path::new("/data/run 3/cell.tif"));
    assert_eq!(
        paths.time_series,
        PathBuf::from("/data/run 3/cell_bundle_width_table.txt")
    );
    assert_eq!(
        paths.histograms,
        PathBuf::from("/data/run 3/cell_all_histograms.txt")
    );
}

#[test]
fn test_format_value() {
    assert_eq!(format_value(0.0), "0.0");
    assert_eq!(format_value(2.5), "2.5");
    assert_eq!(format_value(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(format_value(f64::NAN), "");
}

#[test]
fn test_time_series_nan_rows_have_empty_fields() {
    let analysis = sample_analysis();
    let mut out = Vec::new();
    write_time_series(&mut out, &analysis.time_series).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "time,bundle_mean,bundle_std,bundle_sem");
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "0.0,6.0,0.0,0.0");
    assert_eq!(lines[2], "2.5,,,");
    assert_eq!(lines[3], "5.0,8.0,0.0,0.0");
}

#[test]
fn test_histograms_are_padded_with_empty_fields() {
    let mut table = HistogramTable::default();
    table.push(0.0, WidthDistribution::from_peaks(&[1.0, 2.0], 1.0));
    table.push(10.0, WidthDistribution::default());
    table.push(20.0, WidthDistribution::from_peaks(&[0.75], 1.0));

    let mut out = Vec::new();
    write_histograms(&mut out, &table).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(text, "0.0,10.0,20.0\n2.0,,1.5\n4.0,,\n");
}

#[test]
fn test_export_tables_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let movie = dir.path().join("bundle.tif");
    let analysis = sample_analysis();

    let paths = export_tables(&movie, &analysis).unwrap();

    let table = std::fs::read_to_string(&paths.time_series).unwrap();
    assert!(table.starts_with("time,bundle_mean,bundle_std,bundle_sem\n"));
    assert_eq!(table.lines().count(), 1 + analysis.time_series.len());

    let histograms = std::fs::read_to_string(&paths.histograms).unwrap();
    let mut lines = histograms.lines();
    assert_eq!(lines.next(), Some("0.0,2.5,5.0"));
    assert_eq!(lines.count(), analysis.histograms.max_len());
}

#[test]
fn test_export_into_missing_directory_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let movie = dir.path().join("missing").join("bundle.tif");

    let err = export_tables(&movie, &sample_analysis()).unwrap_err();
    match err {
        Error::Export { path, .. } => {
            assert_eq!(path, dir.path().join("missing/bundle_bundle_width_table.txt"));
        }
        other => panic!("expected export error, got {other:?}"),
    }
}
