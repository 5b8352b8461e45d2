//! Task lifecycle states, stored in `Task::state`.
//!
//! ```text
//! QUEUED -> RUNNING -> IDLE -> QUEUED -> ...
//!              |  \
//!              |   NOTIFIED (woken mid-poll, re-queued after the poll)
//!              v
//!          COMPLETED
//! ```
//!
//! Any non-terminal state may move to `CANCELLED`.

/// Parked; waiting for its waker.
pub(crate) const IDLE: usize = 0;

/// Sitting in a run queue.
pub(crate) const QUEUED: usize = 1;

/// Being polled. Only the worker that made this transition touches the
/// future.
pub(crate) const RUNNING: usize = 2;

/// Output stored, or the future panicked. Terminal.
pub(crate) const COMPLETED: usize = 3;

/// Woken while `RUNNING`; the worker re-queues it after the poll returns.
pub(crate) const NOTIFIED: usize = 4;

/// Aborted before completion. Terminal.
pub(crate) const CANCELLED: usize = 5;
