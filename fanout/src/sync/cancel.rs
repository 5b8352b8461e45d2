use crate::utils::Slab;

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

/// A one-shot cancellation signal shared between tasks.
///
/// Clones observe the same signal. Once [`cancel`](Self::cancel) is called
/// every pending and future [`cancelled`](Self::cancelled) call resolves;
/// the token never resets.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    waiters: Mutex<Slab<Waker>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal and wakes every waiter. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        let wakers: Vec<Waker> = self.inner.waiters.lock().unwrap().drain().collect();

        tracing::debug!(waiters = wakers.len(), "cancellation requested");

        for waker in wakers {
            waker.wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once the token is cancelled.
    pub fn cancelled(&self) -> Cancelled<'_> {
        Cancelled {
            token: self,
            key: None,
        }
    }
}

/// Future returned by [`CancelToken::cancelled`].
pub struct Cancelled<'a> {
    token: &'a CancelToken,
    key: Option<usize>,
}

impl Future for Cancelled<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if this.token.is_cancelled() {
            this.key = None;
            return Poll::Ready(());
        }

        let mut waiters = this.token.inner.waiters.lock().unwrap();

        // `cancel` sets the flag before draining under this lock, so
        // checking again here closes the race with a concurrent cancel.
        if this.token.is_cancelled() {
            this.key = None;
            return Poll::Ready(());
        }

        match this.key.and_then(|key| waiters.get_mut(key)) {
            Some(existing) if existing.will_wake(cx.waker()) => {}
            Some(existing) => *existing = cx.waker().clone(),
            None => this.key = Some(waiters.insert(cx.waker().clone())),
        }

        Poll::Pending
    }
}

impl Drop for Cancelled<'_> {
    fn drop(&mut self) {
        let Some(key) = self.key else {
            return;
        };

        // After a cancel the slab was drained and its keys are stale.
        if !self.token.is_cancelled() {
            self.token.inner.waiters.lock().unwrap().remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::task::Wake;

    struct Counter(AtomicUsize);

    impl Wake for Counter {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn cancel_wakes_pending_waiters_once() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let token = CancelToken::new();
        let mut first = Box::pin(token.cancelled());
        let mut second = Box::pin(token.cancelled());

        assert!(first.as_mut().poll(&mut cx).is_pending());
        assert!(second.as_mut().poll(&mut cx).is_pending());
        assert!(first.as_mut().poll(&mut cx).is_pending());

        token.cancel();
        token.cancel();

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert!(first.as_mut().poll(&mut cx).is_ready());
        assert!(second.as_mut().poll(&mut cx).is_ready());
    }

    #[test]
    fn dropped_waiter_is_unregistered() {
        let token = CancelToken::new();
        let mut cx = Context::from_waker(Waker::noop());

        {
            let mut waiter = Box::pin(token.cancelled());
            assert!(waiter.as_mut().poll(&mut cx).is_pending());
            assert_eq!(token.inner.waiters.lock().unwrap().len(), 1);
        }

        assert_eq!(token.inner.waiters.lock().unwrap().len(), 0);
    }

    #[test]
    fn clones_share_the_signal() {
        let token = CancelToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());

        let mut cx = Context::from_waker(Waker::noop());
        assert!(Box::pin(clone.cancelled()).as_mut().poll(&mut cx).is_ready());
    }
}
