//! The host runtime.
//!
//! A fixed pool of worker threads runs tasks using work-stealing: each
//! worker owns a local queue, newly woken tasks go through a global
//! injector, and idle workers steal from both. Timers are served by the
//! separate driver thread in [`crate::driver`].

mod core;
mod executor;
mod work_stealing;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
