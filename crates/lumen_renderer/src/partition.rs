//! Row-section partitioning for parallel rendering.
//!
//! Divides the image into contiguous row ranges that are rendered
//! independently, one worker thread per range, and collected back in row
//! order.

use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

/// A contiguous range of image rows `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    /// Position of this range in top-to-bottom order
    pub index: usize,
    /// First row (inclusive)
    pub start: u32,
    /// Last row (exclusive)
    pub end: u32,
}

impl RowRange {
    /// Number of rows in the range.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Worker count from hardware parallelism, at least 1.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1)
}

/// Split `height` rows into `workers` contiguous, non-overlapping ranges.
///
/// Each range gets `height / workers` rows and the last one absorbs the
/// remainder. The worker count is clamped to `[1, height]` so no range is
/// empty; a zero height yields no ranges.
pub fn partition_rows(height: u32, workers: usize) -> Vec<RowRange> {
    if height == 0 {
        return Vec::new();
    }

    let count = (workers.max(1) as u64).min(u64::from(height)) as u32;
    let rows_per_worker = height / count;

    (0..count)
        .map(|t| {
            let start = t * rows_per_worker;
            let end = if t == count - 1 {
                height
            } else {
                start + rows_per_worker
            };
            RowRange {
                index: t as usize,
                start,
                end,
            }
        })
        .collect()
}

/// Run `render` once per range in parallel and return the results in range
/// order, independent of completion order.
///
/// Ranges run on a dedicated pool with one thread per range, so every section
/// has its own worker regardless of the global pool size. Returns only after
/// every range has finished. A panic in any worker propagates to the caller.
pub fn render_sections<T, F>(
    ranges: &[RowRange],
    render: F,
) -> Result<Vec<T>, ThreadPoolBuildError>
where
    T: Send,
    F: Fn(&RowRange) -> T + Sync + Send,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(ranges.len().max(1))
        .thread_name(|i| format!("lumen-section-{i}"))
        .build()?;
    debug!("Started {} section workers", pool.current_num_threads());

    Ok(pool.install(|| ranges.par_iter().with_max_len(1).map(render).collect()))
}

/// Test helper that forces ranges to complete last-to-first.
#[cfg(test)]
pub(crate) mod completion {
    use std::sync::{Condvar, Mutex};
    use std::time::Duration;

    /// Makes range `i` wait until every range after it has finished.
    pub(crate) struct ReverseCompletion {
        count: usize,
        finished: Mutex<Vec<usize>>,
        turn: Condvar,
    }

    impl ReverseCompletion {
        pub(crate) fn new(count: usize) -> Self {
            Self {
                count,
                finished: Mutex::new(Vec::with_capacity(count)),
                turn: Condvar::new(),
            }
        }

        /// Block until it is `index`'s turn, then record it as finished.
        pub(crate) fn finish(&self, index: usize) {
            let guard = self.finished.lock().unwrap();
            let (mut guard, wait) = self
                .turn
                .wait_timeout_while(guard, Duration::from_secs(30), |done| {
                    done.len() != self.count - 1 - index
                })
                .unwrap();
            assert!(!wait.timed_out(), "range {index} never got its turn");
            guard.push(index);
            self.turn.notify_all();
        }

        pub(crate) fn order(&self) -> Vec<usize> {
            self.finished.lock().unwrap().clone()
        }
    }
}
