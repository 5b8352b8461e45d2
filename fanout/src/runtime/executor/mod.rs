//! Task executor.
//!
//! - [`core`]: owns the worker threads and the injector,
//! - [`worker`]: the per-thread scheduling loop.

pub(crate) mod core;
pub(crate) mod worker;
