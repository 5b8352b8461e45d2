use super::JoinHandle;
use super::handle::JoinError;
use super::state::{CANCELLED, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use super::waker::make_waker;
use crate::runtime::context::{CURRENT_INJECTOR, CURRENT_LOCALS, CURRENT_WORKER_ID};
use crate::runtime::work_stealing::injector::Injector;

use std::cell::UnsafeCell;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll, Waker};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Type-erased entry point used by the run queues and the shutdown path.
pub(crate) trait Runnable: Send + Sync {
    fn run(self: Arc<Self>);

    fn abort(&self);
}

/// A spawned future together with its scheduling state and output slot.
///
/// Access to `future` and `output` is serialized by `state`: the future is
/// only touched by the thread that moved the task to `RUNNING`, or by
/// `abort` after it moved the task out of `IDLE`/`QUEUED`; the output is
/// written before `COMPLETED` is published and read only after.
pub(crate) struct Task<T> {
    future: UnsafeCell<Option<BoxFuture<T>>>,
    output: UnsafeCell<Option<Result<T, JoinError>>>,
    pub(crate) state: AtomicUsize,
    injector: Arc<Injector>,
    join_waker: Mutex<Option<Waker>>,
    /// Registry key in the injector; `None` if spawned during shutdown.
    key: Option<usize>,
}

unsafe impl<T: Send> Send for Task<T> {}
unsafe impl<T: Send> Sync for Task<T> {}

impl<T: Send + 'static> Task<T> {
    /// Creates a task in the `QUEUED` state and registers it with the
    /// injector. The caller must push it onto a run queue.
    pub(crate) fn new<F>(future: F, injector: Arc<Injector>) -> Arc<Self>
    where
        F: Future<Output = T> + Send + 'static,
    {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let key = injector.register(this.clone());

            Self {
                future: UnsafeCell::new(Some(Box::pin(future))),
                output: UnsafeCell::new(None),
                state: AtomicUsize::new(QUEUED),
                injector,
                join_waker: Mutex::new(None),
                key,
            }
        })
    }

    /// Polls the future once.
    ///
    /// A panic inside the future is caught and stored as
    /// [`JoinError::Panicked`] so the worker thread survives.
    fn poll_once(self: Arc<Self>) {
        if self
            .state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Cancelled while queued.
            return;
        }

        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        // SAFETY: RUNNING grants exclusive access to the future slot.
        let slot = unsafe { &mut *self.future.get() };
        let Some(future) = slot.as_mut() else {
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx))) {
            Ok(Poll::Pending) => self.suspend(),
            Ok(Poll::Ready(value)) => self.complete(Ok(value)),
            Err(payload) => self.complete(Err(JoinError::Panicked(payload))),
        }
    }

    /// Leaves `RUNNING` after a pending poll.
    fn suspend(self: &Arc<Self>) {
        match self
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(NOTIFIED) => {
                if self
                    .state
                    .compare_exchange(NOTIFIED, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    self.injector.push(self.clone());
                } else {
                    self.release_future();
                }
            }
            // Aborted mid-poll; the aborting thread left the future to us.
            Err(_) => self.release_future(),
        }
    }

    fn complete(&self, output: Result<T, JoinError>) {
        self.release_future();

        // SAFETY: still RUNNING (or NOTIFIED/CANCELLED set by others, which
        // never read the slot); the join handle reads only after COMPLETED.
        unsafe { *self.output.get() = Some(output) };

        let finished = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| match s {
                RUNNING | NOTIFIED => Some(COMPLETED),
                _ => None,
            })
            .is_ok();

        if finished {
            self.deregister();
            self.notify_join();
        }
    }

    /// Re-queues the task in response to a wake-up.
    pub(crate) fn schedule(self: &Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.injector.push(self.clone());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Moves the task to `CANCELLED` and wakes its join handle.
    ///
    /// If nobody is polling the task its future is dropped right away;
    /// otherwise the polling worker drops it when the poll returns.
    pub(crate) fn abort(&self) {
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| match s {
                COMPLETED | CANCELLED => None,
                _ => Some(CANCELLED),
            });

        match previous {
            Ok(IDLE | QUEUED) => self.release_future(),
            Ok(_) => {}
            Err(_) => return,
        }

        self.deregister();
        self.notify_join();
    }

    /// Returns the output once the task has reached a terminal state.
    ///
    /// # Panics
    ///
    /// Panics if the output has already been taken.
    pub(crate) fn take_output(&self) -> Option<Result<T, JoinError>> {
        match self.state.load(Ordering::Acquire) {
            COMPLETED => {
                // SAFETY: COMPLETED was published after the write; only the
                // single join handle reads the slot.
                let output = unsafe { (*self.output.get()).take() };
                Some(output.expect("JoinHandle polled after completion"))
            }
            CANCELLED => Some(Err(JoinError::Cancelled)),
            _ => None,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        matches!(self.state.load(Ordering::Acquire), COMPLETED | CANCELLED)
    }

    pub(crate) fn register_join_waker(&self, waker: &Waker) {
        let mut slot = self.join_waker.lock().unwrap();
        match slot.as_ref() {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    fn notify_join(&self) {
        let waker = self.join_waker.lock().unwrap().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn deregister(&self) {
        if let Some(key) = self.key {
            self.injector.deregister(key);
        }
    }

    fn release_future(&self) {
        // SAFETY: callers hold exclusive access per the state protocol.
        let future = unsafe { (*self.future.get()).take() };
        drop(future);
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        self.poll_once();
    }

    fn abort(&self) {
        Task::abort(self);
    }
}

/// Spawns a future onto the current runtime.
///
/// From a worker thread the task goes to that worker's local queue; from
/// any other runtime thread it goes to the global injector.
///
/// # Panics
///
/// Panics if called outside of a Fanout runtime.
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let injector = CURRENT_INJECTOR.with(|cell| {
        cell.borrow()
            .as_ref()
            .expect("spawn must be called within the context of a fanout runtime")
            .clone()
    });

    let task = Task::new(future, injector.clone());

    let pushed_locally = CURRENT_WORKER_ID.with(|id| {
        let Some(id) = *id.borrow() else {
            return false;
        };

        CURRENT_LOCALS.with(|locals| match locals.borrow().as_ref() {
            Some(locals) => {
                locals[id].push(task.clone());
                true
            }
            None => false,
        })
    });

    if pushed_locally {
        injector.notify();
    } else {
        injector.push(task.clone());
    }

    JoinHandle::new(task)
}
