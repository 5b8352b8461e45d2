use super::core::Task;

use std::sync::Arc;
use std::task::{Wake, Waker};

impl<T: Send + 'static> Wake for Task<T> {
    fn wake(self: Arc<Self>) {
        Task::schedule(&self);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        Task::schedule(self);
    }
}

/// Builds the waker handed to the task's future on every poll.
///
/// Waking re-queues the task on the global injector, or marks it
/// `NOTIFIED` if it is being polled right now.
pub(crate) fn make_waker<T: Send + 'static>(task: Arc<Task<T>>) -> Waker {
    Waker::from(task)
}
