//! Spawning and joining tasks.
//!
//! - [`spawn`] schedules a future on the current runtime and returns a
//!   [`JoinHandle`],
//! - [`JoinSet`] manages a group of tasks and yields their outputs in
//!   completion order.

pub(crate) mod handle;
pub(crate) mod set;
pub(crate) mod state;
pub(crate) mod waker;

pub(crate) mod core;

pub(crate) use self::core::{Runnable, Task};

pub use self::core::spawn;
pub use handle::{JoinError, JoinHandle};
pub use set::JoinSet;
