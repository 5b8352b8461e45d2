//! Timers backed by the runtime's driver thread.
//!
//! - [`sleep`] and [`sleep_until`] suspend a task until a deadline,
//! - [`timeout`] bounds how long a future may run,
//! - [`instrumented`] measures how long a future takes.

mod instrumented;
mod sleep;
mod timeout;

pub use instrumented::{Instrumented, instrumented};
pub use sleep::{Sleep, sleep, sleep_until};
pub use timeout::{Elapsed, Timeout, timeout};
