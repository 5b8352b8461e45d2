use super::orchestrator::{Run, Summary};
use super::result::TaskResult;
use crate::error::{Error, Result};

use std::io::Write;

/// Banner printed by variants that do not list individual runners.
pub const BANNER: &str = "All fibers complete";

/// Formats the stdout line of one completed runner.
pub fn task_line(result: &TaskResult) -> String {
    format!(
        "Task {} completed in {:.2} seconds",
        result.task_id(),
        result.duration().as_secs_f64()
    )
}

/// Writes the stdout part of the report: one line per result in arrival
/// order, or the banner.
pub fn write<W: Write>(run: &Run, out: &mut W) -> Result<()> {
    if run.variant().reports_each_task() {
        for result in run.results() {
            writeln!(out, "{}", task_line(result)).map_err(Error::Report)?;
        }
    } else {
        writeln!(out, "{BANNER}").map_err(Error::Report)?;
    }

    out.flush().map_err(Error::Report)
}

/// Emits the run summary as a log event. Never touches stdout.
pub fn log_summary(summary: &Summary) {
    tracing::info!(
        launched = summary.launched,
        completed = summary.completed,
        interrupted = summary.interrupted,
        timed_out = summary.timed_out,
        wall_time = ?summary.wall_time,
        heap_before = summary.heap_before,
        heap_after = summary.heap_after,
        heap_delta = summary.heap_delta(),
        "benchmark finished"
    );
}
