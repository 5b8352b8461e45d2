use super::core::Task;

use std::any::Any;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Why a task did not produce its output.
#[derive(thiserror::Error)]
pub enum JoinError {
    /// The task was aborted before it finished.
    #[error("task was cancelled")]
    Cancelled,

    /// The task's future panicked; the payload is kept so it can be
    /// re-raised with [`std::panic::resume_unwind`].
    #[error("task panicked: {}", panic_message(.0.as_ref()))]
    Panicked(Box<dyn Any + Send + 'static>),
}

impl JoinError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl fmt::Debug for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("Cancelled"),
            Self::Panicked(payload) => f
                .debug_tuple("Panicked")
                .field(&panic_message(payload.as_ref()))
                .finish(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

/// Owned handle to a spawned task.
///
/// Awaiting it yields the task's output, or a [`JoinError`] if the task was
/// aborted or panicked. Dropping the handle detaches the task; it keeps
/// running.
pub struct JoinHandle<T> {
    task: Arc<Task<T>>,
}

impl<T: Send + 'static> JoinHandle<T> {
    pub(crate) fn new(task: Arc<Task<T>>) -> Self {
        Self { task }
    }

    /// Cancels the task. Its future is dropped at the next opportunity and
    /// awaiting this handle yields [`JoinError::Cancelled`].
    ///
    /// Has no effect on a task that already finished.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Returns `true` once the task completed, panicked or was aborted.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T: Send + 'static> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(output) = self.task.take_output() {
            return Poll::Ready(output);
        }

        // Register before re-checking so a completion in between is not lost.
        self.task.register_join_waker(cx.waker());

        match self.task.take_output() {
            Some(output) => Poll::Ready(output),
            None => Poll::Pending,
        }
    }
}
