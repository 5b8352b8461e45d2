use crate::driver::command::Command;
use crate::runtime::context;

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Waits until `duration` has elapsed.
///
/// The deadline is fixed when `sleep` is called, not on first poll.
///
/// # Panics
///
/// Panics if polled outside of a Fanout runtime.
///
/// ```rust,ignore
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    sleep_until(Instant::now() + duration)
}

/// Waits until `deadline` is reached.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep {
        deadline,
        registered: None,
        cancelled: Arc::new(AtomicBool::new(false)),
    }
}

/// Future returned by [`sleep`] and [`sleep_until`].
///
/// The timer is registered with the driver on first poll. Dropping the
/// future before the deadline disarms the timer so its waker is never
/// called.
pub struct Sleep {
    deadline: Instant,
    /// Waker the driver currently holds for this sleep.
    registered: Option<Waker>,
    /// Shared with the driver; set once the registered waker is stale.
    cancelled: Arc<AtomicBool>,
}

impl Sleep {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn register(&mut self, waker: &Waker) {
        if self.registered.as_ref().is_some_and(|w| w.will_wake(waker)) {
            return;
        }

        // The task moved to another waker: disarm the old entry.
        if self.registered.is_some() {
            self.cancelled.store(true, Ordering::Release);
            self.cancelled = Arc::new(AtomicBool::new(false));
        }

        let sent = context::driver().send(Command::SetTimer {
            deadline: self.deadline,
            waker: waker.clone(),
            cancelled: self.cancelled.clone(),
        });

        if sent.is_err() {
            tracing::warn!("timer registered after the driver stopped");
        }

        self.registered = Some(waker.clone());
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if this.is_elapsed() {
            this.cancelled.store(true, Ordering::Release);
            return Poll::Ready(());
        }

        this.register(cx.waker());
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
