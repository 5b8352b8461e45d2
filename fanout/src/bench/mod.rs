//! The fan-out sleep benchmark.
//!
//! An [`Orchestrator`] launches one [`run_task`] runner per task id on the
//! current runtime. Every runner sleeps for the configured duration and
//! reports a [`TaskResult`]; the orchestrator gathers them in arrival order,
//! optionally bounded by an overall wait, and [`report`] renders them.

mod config;
mod orchestrator;
mod result;
mod runner;

pub mod memory;
pub mod report;

pub use config::{Config, DEFAULT_SLEEP, DEFAULT_TASKS, DEFAULT_WAIT, Variant};
pub use orchestrator::{Orchestrator, Phase, Run, Summary};
pub use result::{TaskOutcome, TaskResult};
pub use runner::run_task;
