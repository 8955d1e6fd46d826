//! Progress reporting for movie analysis.

use common::SharedFn;

/// Reported once per completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameProgress {
    /// Frames finished so far, including this one.
    pub completed: usize,
    /// Frames selected for analysis.
    pub total: usize,
    /// Index of the finished frame in the full movie.
    pub frame_index: usize,
}

/// Invoked from worker threads, in completion order.
pub type ProgressCallback = SharedFn<FrameProgress>;
