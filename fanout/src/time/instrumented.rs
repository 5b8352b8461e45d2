use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Wraps a future and measures how long it takes to complete.
///
/// Resolves to the inner output together with the time elapsed since the
/// **first poll**, not since construction.
///
/// ```rust,ignore
/// let ((), elapsed) = instrumented(sleep(Duration::from_millis(5))).await;
/// ```
pub fn instrumented<F: Future>(future: F) -> Instrumented<F> {
    Instrumented {
        future,
        start: None,
    }
}

pub struct Instrumented<F> {
    future: F,
    start: Option<Instant>,
}

impl<F: Future> Future for Instrumented<F> {
    type Output = (F::Output, Duration);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // SAFETY: `future` is structurally pinned and never moved.
        let this = unsafe { self.get_unchecked_mut() };
        let start = *this.start.get_or_insert_with(Instant::now);

        match unsafe { Pin::new_unchecked(&mut this.future) }.poll(cx) {
            Poll::Ready(output) => Poll::Ready((output, start.elapsed())),
            Poll::Pending => Poll::Pending,
        }
    }
}
