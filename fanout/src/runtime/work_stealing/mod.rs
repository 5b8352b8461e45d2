//! Run queues for the work-stealing scheduler.
//!
//! - [`injector`]: the global queue shared by all workers,
//! - [`queue`]: one local queue per worker, stealable by its peers.

pub(crate) mod injector;
pub(crate) mod queue;
