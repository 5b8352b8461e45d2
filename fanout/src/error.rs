use std::io;

/// Errors surfaced by the runtime and the benchmark harness.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The timer driver could not set up its wake pipe or thread.
    #[error("failed to start the timer driver: {0}")]
    Driver(#[source] io::Error),

    /// A worker thread could not be spawned.
    #[error("failed to spawn a worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// Writing the benchmark report failed.
    #[error("failed to write the report: {0}")]
    Report(#[source] io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
