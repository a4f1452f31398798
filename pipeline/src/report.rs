use std::time::Duration;

use crate::{CommandError, TaskOutcome};

/// Receives live progress from a running pipeline.
///
/// All methods default to doing nothing.
pub trait Reporter {
    /// `index` is zero-based.
    fn task_started(&mut self, _index: usize, _total: usize, _status_line: &str) {}

    fn task_succeeded(&mut self, _status_line: &str, _elapsed: Duration) {}

    /// The task's command failed, but its suppression policy let the pipeline continue.
    fn task_suppressed(&mut self, _status_line: &str, _error: &CommandError) {}

    /// The task failed and the pipeline is about to abort.
    fn task_failed(&mut self, _status_line: &str, _error: &anyhow::Error) {}

    fn pipeline_completed(&mut self, _outcomes: &[TaskOutcome]) {}
}

/// A reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {}
