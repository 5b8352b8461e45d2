//! Synchronization primitives for Fanout tasks.
//!
//! - [`CancelToken`]: a shared one-shot cancellation signal,
//! - [`mpsc`]: an unbounded multi-producer, single-consumer channel.
//!
//! Neither primitive blocks a worker thread; waiting tasks are suspended
//! and woken by the side that makes progress possible.

mod cancel;

pub mod mpsc;

pub use cancel::{CancelToken, Cancelled};
