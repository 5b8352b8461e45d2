//! Internal data structures shared by the runtime primitives.

mod slab;

pub(crate) use slab::Slab;
