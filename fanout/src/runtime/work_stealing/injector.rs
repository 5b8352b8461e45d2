use crate::runtime::task::Runnable;
use crate::utils::Slab;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::time::Duration;

/// Shared handle to the global injector.
pub(crate) type InjectorHandle = Arc<Injector>;

/// Upper bound on an idle worker's sleep.
///
/// Pushes to a local queue signal the condvar only when some worker is
/// parked, so a worker that was about to park may miss one; it picks the
/// task up on its next wake-up at the latest.
const PARK_TIMEOUT: Duration = Duration::from_millis(50);

/// Global run queue.
///
/// Tasks spawned from outside a worker and tasks rescheduled by a waker land
/// here. Idle workers park on the condvar until something is pushed.
///
/// The injector also keeps a registry of every unfinished task, so that
/// shutdown can abort tasks that sit in no queue at all (for instance a
/// task waiting on a channel whose waker it owns itself).
pub(crate) struct Injector {
    queue: Mutex<VecDeque<Arc<dyn Runnable>>>,
    condvar: Condvar,
    shutdown: AtomicBool,
    parked: AtomicUsize,
    registry: Mutex<Slab<Weak<dyn Runnable>>>,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
            parked: AtomicUsize::new(0),
            registry: Mutex::new(Slab::new()),
        }
    }

    /// Records a new task. Returns `None` once shutdown has started; such a
    /// task is never run.
    pub(crate) fn register(&self, task: Weak<dyn Runnable>) -> Option<usize> {
        let mut registry = self.registry.lock().unwrap();

        // Checked under the registry lock: `shutdown` drains after setting
        // the flag, so every accepted task is seen by the drain.
        if self.is_shutdown() {
            return None;
        }

        Some(registry.insert(task))
    }

    /// Forgets a task that reached a terminal state.
    pub(crate) fn deregister(&self, key: usize) {
        self.registry.lock().unwrap().remove(key);
    }

    /// Wakes one parked worker, if any. Used after pushing to a local queue.
    pub(crate) fn notify(&self) {
        if self.parked.load(Ordering::Acquire) > 0 {
            // A worker counted as parked holds the queue lock until it is
            // inside the wait, so taking the lock here cannot lose the signal.
            let _queue = self.queue.lock().unwrap();
            self.condvar.notify_one();
        }
    }

    /// Queues `task` and wakes one parked worker. After shutdown the task is
    /// dropped instead.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        if self.is_shutdown() {
            return;
        }

        self.queue.lock().unwrap().push_back(task);
        self.condvar.notify_one();
    }

    pub(crate) fn steal(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.lock().unwrap().pop_front()
    }

    /// Parks the calling worker until a task is pushed, [`notify`] is
    /// called, shutdown starts, or [`PARK_TIMEOUT`] elapses.
    ///
    /// [`notify`]: Self::notify
    pub(crate) fn park(&self) {
        let queue = self.queue.lock().unwrap();

        if !queue.is_empty() || self.is_shutdown() {
            return;
        }

        self.parked.fetch_add(1, Ordering::AcqRel);
        let _ = self.condvar.wait_timeout(queue, PARK_TIMEOUT).unwrap();
        self.parked.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Flags shutdown, wakes every parked worker, drops queued tasks and
    /// aborts every task that has not finished.
    ///
    /// Queued tasks hold an `Arc` back to the injector, and idle tasks may
    /// hold their own waker, so neither would ever be freed otherwise.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);

        let orphaned = std::mem::take(&mut *self.queue.lock().unwrap());
        self.condvar.notify_all();
        drop(orphaned);

        // Collected first: aborting drops futures, which may deregister or
        // wake other tasks and so take these locks again.
        let live: Vec<_> = self.registry.lock().unwrap().drain().collect();

        tracing::debug!(tasks = live.len(), "aborting unfinished tasks");

        for task in live.iter().filter_map(Weak::upgrade) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn notify_wakes_a_parked_worker_before_the_timeout() {
        let injector = Arc::new(Injector::new());
        let parker = injector.clone();

        let worker = thread::spawn(move || {
            let start = Instant::now();
            parker.park();
            start.elapsed()
        });

        while injector.parked.load(Ordering::Acquire) == 0 {
            thread::yield_now();
        }
        injector.notify();

        let parked_for = worker.join().unwrap();
        assert!(parked_for < PARK_TIMEOUT);
    }

    #[test]
    fn register_is_refused_after_shutdown() {
        struct Noop;

        impl Runnable for Noop {
            fn run(self: Arc<Self>) {}
            fn abort(&self) {}
        }

        let injector = Injector::new();
        let task: Arc<dyn Runnable> = Arc::new(Noop);

        let key = injector.register(Arc::downgrade(&task)).unwrap();
        injector.deregister(key);

        injector.shutdown();
        assert!(injector.register(Arc::downgrade(&task)).is_none());
    }
}
