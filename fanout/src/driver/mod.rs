//! Timer driver.
//!
//! The driver runs on its own thread and owns every pending sleep deadline.
//! Worker threads register deadlines by sending [`command::Command`]s through a
//! [`DriverHandle`]; the driver parks until the earliest deadline (or a new
//! command) and wakes the tasks whose deadlines have passed.
//!
//! There is no I/O readiness tracking, only deadlines.

mod core;
mod parker;
mod timer;

pub(crate) mod command;

pub(crate) use self::core::{Driver, DriverHandle};
