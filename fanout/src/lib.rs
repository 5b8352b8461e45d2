//! # Fanout
//!
//! **Fanout** measures how well a lightweight task runtime copes with a very
//! large number of concurrently sleeping tasks.
//!
//! The crate has two halves:
//!
//! - a small multi-threaded runtime: a work-stealing executor, a timer
//!   driver thread parked on a self-pipe, and the primitives the benchmark
//!   needs ([`time`], [`sync`], [`task`]),
//! - the benchmark itself ([`bench`]): spawn N runners that each sleep,
//!   gather their timings in arrival order, and report them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fanout::RuntimeBuilder;
//! use fanout::bench::{Config, Orchestrator, Variant};
//!
//! let runtime = RuntimeBuilder::new().build()?;
//! let mut run = runtime.block_on(Orchestrator::new(Config::new(Variant::Bounded, 1_000)).run());
//! run.report(&mut std::io::stdout().lock())?;
//! ```
//!
//! ## Modules
//!
//! - [`bench`]: orchestrator, task runner, report and heap probe
//! - [`task`]: spawning, join handles and join sets
//! - [`time`]: sleep, timeout and instrumentation
//! - [`sync`]: cancellation tokens and an async channel

mod driver;
mod error;
mod runtime;
mod utils;

pub mod bench;
pub mod sync;
pub mod time;

pub use error::{Error, Result};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use fanout_macros::{select, test};
