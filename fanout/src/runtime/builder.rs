use super::Runtime;
use crate::error::Result;

use std::thread;

/// Configures and builds a [`Runtime`].
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new().worker_threads(4).build()?;
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    worker_threads: usize,
}

impl RuntimeBuilder {
    /// Uses one worker per available CPU, or a single worker if that cannot
    /// be determined.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self { worker_threads }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Starts the timer driver and the worker threads.
    pub fn build(self) -> Result<Runtime> {
        Runtime::new(self.worker_threads)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
