use super::executor::core::Executor;
use super::task::{JoinError, JoinHandle};
use crate::driver::command::Command;
use crate::driver::{Driver, DriverHandle};
use crate::error::{Error, Result};

use std::panic;
use std::sync::mpsc;
use std::thread::JoinHandle as ThreadHandle;

/// A multi-threaded task runtime.
///
/// Owns a pool of worker threads and one timer driver thread. Dropping the
/// runtime stops the workers, aborts every task that has not finished
/// (dropping its future, whatever it was waiting on), and shuts the driver
/// down.
pub struct Runtime {
    executor: Executor,
    driver: DriverHandle,
    driver_thread: Option<ThreadHandle<()>>,
}

impl Runtime {
    /// Starts the timer driver and `worker_threads` workers.
    pub(crate) fn new(worker_threads: usize) -> Result<Self> {
        let (driver, driver_thread) = Driver::start().map_err(Error::Driver)?;

        let executor = match Executor::new(driver.clone(), worker_threads) {
            Ok(executor) => executor,
            Err(err) => {
                let _ = driver.send(Command::Shutdown);
                let _ = driver_thread.join();
                return Err(Error::Spawn(err));
            }
        };

        tracing::debug!(workers = worker_threads, "runtime started");

        Ok(Self {
            executor,
            driver,
            driver_thread: Some(driver_thread),
        })
    }

    /// Spawns a future onto the runtime.
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 1 + 1 });
    /// ```
    pub fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// The future runs on a worker; its output is sent back to the caller
    /// through a channel.
    ///
    /// # Panics
    ///
    /// Re-raises the future's panic on the calling thread, and panics if
    /// the future was cancelled before it finished.
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (transmitter, receiver) = mpsc::channel();
        let handle = self.spawn(future);

        self.spawn(async move {
            let _ = transmitter.send(handle.await);
        });

        match receiver.recv() {
            Ok(Ok(output)) => output,
            Ok(Err(JoinError::Panicked(payload))) => panic::resume_unwind(payload),
            Ok(Err(JoinError::Cancelled)) | Err(_) => {
                panic!("block_on future was cancelled before completing")
            }
        }
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime:
    /// 1. stops the workers, drops queued tasks and aborts unfinished ones,
    /// 2. joins the worker threads,
    /// 3. stops and joins the timer driver.
    fn drop(&mut self) {
        self.executor.shutdown();
        self.executor.join();

        let _ = self.driver.send(Command::Shutdown);

        if let Some(thread) = self.driver_thread.take() {
            let _ = thread.join();
        }

        tracing::debug!("runtime stopped");
    }
}
