use super::memory::allocated_bytes;
use super::result::{TaskOutcome, TaskResult};
use crate::sync::CancelToken;
use crate::time::sleep;

use fanout_macros::select;
use std::time::{Duration, Instant};

enum Wake {
    Elapsed,
    Cancelled,
}

/// One unit of benchmark work: sleep for `duration` and report how long it
/// actually took.
///
/// With `sample_memory` the heap is sampled right before and right after
/// the sleep. If `cancel` fires first the runner returns
/// [`TaskOutcome::Interrupted`] and leaves the token cancelled.
pub async fn run_task(
    task_id: usize,
    duration: Duration,
    sample_memory: bool,
    cancel: CancelToken,
) -> TaskOutcome {
    let started = Instant::now();
    let memory_before = sample_memory.then(allocated_bytes);

    let wake = select!(
        sleep(duration) => |_| Wake::Elapsed,
        cancel.cancelled() => |_| Wake::Cancelled,
    );

    let finished = Instant::now();

    match wake {
        Wake::Elapsed => {
            let memory_after = sample_memory.then(allocated_bytes);
            TaskOutcome::Completed(TaskResult::new(
                task_id,
                started,
                finished,
                memory_before,
                memory_after,
            ))
        }
        Wake::Cancelled => {
            let elapsed = finished.saturating_duration_since(started);
            tracing::debug!(task_id, ?elapsed, "runner interrupted");

            TaskOutcome::Interrupted { task_id, elapsed }
        }
    }
}
