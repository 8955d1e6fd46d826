//! Tests for frame selection and whole-movie analysis.

use std::sync::{Arc, Mutex};

use common::Buffer2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::config::DistanceMapConfig;
use crate::error::Error;
use crate::movie::Frame;

const WIDTH: usize = 24;
const HEIGHT: usize = 64;
const GAP: usize = 9;

/// Bright horizontal bars `bar` rows tall separated by dark gaps, starting
/// with a gap. For odd `bar` every full bar has a single ridge row at
/// distance `(bar + 1) / 2`.
fn bar_frame(bar: usize) -> Frame {
    Frame::from_gray(Buffer2::from_fn(WIDTH, HEIGHT, |_, y| {
        if y % (bar + GAP) >= GAP { 180.0 } else { 30.0 }
    }))
}

fn uniform_frame(value: f32) -> Frame {
    Frame::from_gray(Buffer2::new_filled(WIDTH, HEIGHT, value))
}

fn small_config() -> AnalysisConfig {
    AnalysisConfig {
        time_per_frame: 1.0,
        cutoff: None,
        stride: 1,
        pixel_size: 1.0,
        max_concurrent_frames: 4,
        distance_map: DistanceMapConfig {
            threshold_block_size: 21,
            denoise_level: 3,
            ..Default::default()
        },
    }
}

#[test]
fn test_select_frames_every_stride() {
    let selected = select_frames(100, None, 10).unwrap();
    assert_eq!(selected, (0..100).step_by(10).collect::<Vec<_>>());
}

#[test]
fn test_select_frames_cutoff_truncates_and_clamps() {
    assert_eq!(select_frames(100, Some(35), 10).unwrap(), vec![0, 10, 20, 30]);
    assert_eq!(select_frames(100, Some(30), 10).unwrap(), vec![0, 10, 20]);
    assert_eq!(select_frames(5, Some(500), 2).unwrap(), vec![0, 2, 4]);
    assert_eq!(select_frames(5, Some(1), 3).unwrap(), vec![0]);
}

#[test]
fn test_select_frames_rejects_empty_selection() {
    let err = select_frames(100, Some(0), 10).unwrap_err();
    assert!(matches!(
        err,
        Error::EmptySelection {
            total: 100,
            cutoff: Some(0),
            stride: 10
        }
    ));
}

#[test]
fn test_select_frames_rejects_zero_stride() {
    assert!(matches!(
        select_frames(10, None, 0),
        Err(Error::InvalidParameter { name: "stride", .. })
    ));
}

#[test]
fn test_stride_sets_rows_and_timestamps() {
    let frames = (0..100).map(|_| bar_frame(5)).collect();
    let stack = FrameStack::from_frames(frames).unwrap();
    let config = AnalysisConfig {
        stride: 10,
        time_per_frame: 0.5,
        ..small_config()
    };

    let analysis = analyze(&stack, &config, &ProgressCallback::default()).unwrap();

    assert_eq!(analysis.frame_indices, (0..100).step_by(10).collect::<Vec<_>>());
    assert_eq!(analysis.time_series.len(), 10);
    assert_eq!(analysis.histograms.len(), 10);
    let times: Vec<f64> = analysis.time_series.times().collect();
    let expected: Vec<f64> = (0..10).map(|i| i as f64 * 0.5 * 10.0).collect();
    assert_eq!(times, expected);
    for (row, column) in analysis
        .time_series
        .rows()
        .iter()
        .zip(analysis.histograms.columns())
    {
        assert_eq!(row.time, column.time);
        assert_eq!(row.bundle_mean, 6.0, "bar of 5 rows is 6 wide at the ridge");
        assert_eq!(row.bundle_std, 0.0);
    }
    assert_eq!(analysis.example_frame_index(), Some(50));
}

#[test]
fn test_results_follow_frame_order() {
    // Frame k carries bars 3 + 2k rows tall, so the mean width is 4 + 2k.
    let frames = (0..8).map(|k| bar_frame(3 + 2 * k)).collect();
    let stack = FrameStack::from_frames(frames).unwrap();

    let analysis = analyze(&stack, &small_config(), &ProgressCallback::default()).unwrap();

    let means: Vec<f64> = analysis
        .time_series
        .rows()
        .iter()
        .map(|row| row.bundle_mean)
        .collect();
    let expected: Vec<f64> = (0..8).map(|k| (4 + 2 * k) as f64).collect();
    assert_eq!(means, expected);
}

#[test]
fn test_degenerate_frames_yield_nan_and_processing_continues() {
    let frames = vec![
        bar_frame(7),
        uniform_frame(0.0),
        bar_frame(7),
        uniform_frame(250.0),
    ];
    let stack = FrameStack::from_frames(frames).unwrap();

    let analysis = analyze(&stack, &small_config(), &ProgressCallback::default()).unwrap();
    let rows = analysis.time_series.rows();

    assert_eq!(rows.len(), 4);
    for i in [1, 3] {
        assert!(rows[i].bundle_mean.is_nan(), "frame {i} should be NaN");
        assert!(rows[i].bundle_std.is_nan());
        assert!(rows[i].bundle_sem.is_nan());
        assert!(analysis.histograms.columns()[i].widths.is_empty());
    }
    for i in [0, 2] {
        assert_eq!(rows[i].bundle_mean, 8.0);
        assert!(!analysis.histograms.columns()[i].widths.is_empty());
    }
}

#[test]
fn test_cutoff_limits_processed_frames() {
    let frames = (0..20).map(|_| bar_frame(5)).collect();
    let stack = FrameStack::from_frames(frames).unwrap();
    let config = AnalysisConfig {
        cutoff: Some(7),
        stride: 3,
        ..small_config()
    };

    let analysis = analyze(&stack, &config, &ProgressCallback::default()).unwrap();
    assert_eq!(analysis.frame_indices, vec![0, 3, 6]);
}

#[test]
fn test_empty_selection_is_an_error() {
    let stack = FrameStack::from_frames(vec![bar_frame(5)]).unwrap();
    let config = AnalysisConfig {
        cutoff: Some(0),
        ..small_config()
    };
    let err = analyze(&stack, &config, &ProgressCallback::default()).unwrap_err();
    assert!(matches!(err, Error::EmptySelection { .. }));
}

#[test]
fn test_invalid_config_fails_before_processing() {
    let stack = FrameStack::from_frames(vec![bar_frame(5)]).unwrap();
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let progress = ProgressCallback::new(move |_: FrameProgress| {
        *counter.lock().unwrap() += 1;
    });

    let config = AnalysisConfig {
        pixel_size: -1.0,
        ..small_config()
    };
    assert!(analyze(&stack, &config, &progress).is_err());
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn test_progress_reported_once_per_frame() {
    let frames = (0..30).map(|_| bar_frame(5)).collect();
    let stack = FrameStack::from_frames(frames).unwrap();
    let config = AnalysisConfig {
        stride: 3,
        ..small_config()
    };

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress = ProgressCallback::new(move |p: FrameProgress| {
        sink.lock().unwrap().push(p);
    });

    analyze(&stack, &config, &progress).unwrap();

    let mut seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 10);
    assert!(seen.iter().all(|p| p.total == 10));

    let mut completed: Vec<usize> = seen.iter().map(|p| p.completed).collect();
    completed.sort_unstable();
    assert_eq!(completed, (1..=10).collect::<Vec<_>>());

    seen.sort_by_key(|p| p.frame_index);
    let indices: Vec<usize> = seen.iter().map(|p| p.frame_index).collect();
    assert_eq!(indices, (0..30).step_by(3).collect::<Vec<_>>());
}

#[test]
fn test_concurrency_does_not_change_results() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let frames = (0..12)
        .map(|k| {
            let bar = 5 + 2 * (k % 3);
            Frame::from_gray(Buffer2::from_fn(WIDTH, HEIGHT, |_, y| {
                let base = if y % (bar + GAP) >= GAP { 180.0 } else { 30.0 };
                base + rng.random_range(-20.0f32..20.0)
            }))
        })
        .collect();
    let stack = FrameStack::from_frames(frames).unwrap();

    let serial = AnalysisConfig {
        max_concurrent_frames: 1,
        ..small_config()
    };
    let parallel = AnalysisConfig {
        max_concurrent_frames: 5,
        ..small_config()
    };

    let a = analyze(&stack, &serial, &ProgressCallback::default()).unwrap();
    let b = analyze(&stack, &parallel, &ProgressCallback::default()).unwrap();

    assert_eq!(a.frame_indices, b.frame_indices);
    assert_eq!(a.histograms, b.histograms);
    for (ra, rb) in a.time_series.rows().iter().zip(b.time_series.rows()) {
        assert_eq!(ra.bundle_mean.to_bits(), rb.bundle_mean.to_bits());
        assert_eq!(ra.bundle_std.to_bits(), rb.bundle_std.to_bits());
    }
}

#[test]
fn test_custom_builder_is_used() {
    use crate::distance_map::{ExactEuclideanTransform, MajorityMedianFilter};

    /// Marks every pixel brighter than 100 as foreground.
    struct Fixed;

    impl AdaptiveThreshold for Fixed {
        fn threshold_map(&self, image: &Buffer2<f32>, _: usize, _: f32) -> Buffer2<f32> {
            Buffer2::new_filled(image.width(), image.height(), 100.0)
        }
    }

    let stack = FrameStack::from_frames(vec![bar_frame(9), bar_frame(11)]).unwrap();
    let config = small_config();
    let builder = DistanceMapBuilder::with_backends(
        config.distance_map,
        Fixed,
        MajorityMedianFilter,
        ExactEuclideanTransform,
    )
    .unwrap();

    let analysis =
        analyze_with_builder(&stack, &config, &builder, &ProgressCallback::default()).unwrap();
    let means: Vec<f64> = analysis
        .time_series
        .rows()
        .iter()
        .map(|row| row.bundle_mean)
        .collect();
    assert_eq!(means, vec![10.0, 12.0]);
}
