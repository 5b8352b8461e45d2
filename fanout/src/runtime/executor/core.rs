use crate::driver::DriverHandle;
use crate::runtime::context::enter_context;
use crate::runtime::executor::worker::Worker;
use crate::runtime::task::{JoinHandle, Task};
use crate::runtime::work_stealing::injector::Injector;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle as ThreadHandle};

/// Owns the worker threads and the global injector.
pub(crate) struct Executor {
    injector: Arc<Injector>,
    locals: Arc<Vec<Arc<LocalQueue>>>,
    threads: Vec<ThreadHandle<()>>,
}

impl Executor {
    /// Spawns `threads` workers, each running inside the runtime context.
    ///
    /// If a worker thread cannot be spawned, the ones already started are
    /// shut down before the error is returned.
    pub(crate) fn new(driver: DriverHandle, threads: usize) -> io::Result<Self> {
        let injector = Arc::new(Injector::new());
        let locals: Arc<Vec<_>> = Arc::new((0..threads).map(|_| Arc::new(LocalQueue::new())).collect());

        let mut executor = Self {
            injector,
            locals,
            threads: Vec::with_capacity(threads),
        };

        for id in 0..threads {
            let worker = Worker::new(id, executor.locals.clone(), executor.injector.clone());
            let driver = driver.clone();
            let injector = executor.injector.clone();

            let spawned = thread::Builder::new()
                .name(format!("fanout-worker-{id}"))
                .spawn(move || enter_context(driver, injector, || worker.run()));

            match spawned {
                Ok(handle) => executor.threads.push(handle),
                Err(err) => {
                    executor.shutdown();
                    executor.join();
                    return Err(err);
                }
            }
        }

        Ok(executor)
    }

    /// Schedules a future from outside the worker pool.
    pub(crate) fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let task = Task::new(future, self.injector.clone());
        self.injector.push(task.clone());
        JoinHandle::new(task)
    }

    /// Tells every worker to exit, drops globally queued tasks and aborts
    /// every task that has not finished.
    pub(crate) fn shutdown(&self) {
        self.injector.shutdown();
    }

    /// Waits for the workers to exit, then drops whatever was left in
    /// their local queues.
    pub(crate) fn join(&mut self) {
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }

        for local in self.locals.iter() {
            local.clear();
        }
    }
}
