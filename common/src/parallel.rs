//! Bounded parallel mapping over independent work items.
//!
//! Items are processed with rayon in chunks of at most `max_concurrent`, so
//! the number of items held in memory at once stays bounded. Output order
//! always matches input order.

use std::num::NonZeroUsize;

use rayon::prelude::*;

/// Number of worker threads available to this process, at least 1.
pub fn available_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Maps a fallible `f` over `items` in parallel with at most `max_concurrent`
/// items in flight.
///
/// Stops after the first chunk that produced an error and returns that error.
/// Other items of the failing chunk may still have run.
///
/// # Panics
///
/// Panics if `max_concurrent` is 0.
pub fn try_par_map_limited<T, R, E, F>(
    items: &[T],
    max_concurrent: usize,
    f: F,
) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync,
{
    assert!(max_concurrent > 0, "max_concurrent must be > 0");

    let mut results = Vec::with_capacity(items.len());
    for chunk in items.chunks(max_concurrent) {
        let chunk_results: Result<Vec<R>, E> = chunk.par_iter().map(&f).collect();
        results.extend(chunk_results?);
    }
    Ok(results)
}
