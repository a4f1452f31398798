//! A small, strictly sequential task pipeline.
//!
//! Tasks are registered in order against one shared [`Context`] and run one at a
//! time. A task is either a shell command ([`ShellCommandTask`]) or a plain
//! function. Shell failures can be suppressed by a [`SuppressPolicy`]; any other
//! failure aborts the run with a [`PipelineError`] naming the failed task.

/// Shared state passed from task to task
mod context;
pub use context::Context;

/// Running commands in a child shell
mod shell;
pub use shell::{CapturedStdio, CommandError, CommandFailure, CommandOutput, ShellExecutor, SystemShell};

/// A scripted stand-in for the shell
mod scripted;
pub use scripted::ScriptedShell;

/// Shell command tasks and their options
mod shell_task;
pub use shell_task::{OnSuccess, ShellCommandTask, ShellOptions, SuppressPolicy, SuppressPredicate};

/// Task definitions
mod task;
pub use task::{StatusLine, Task, TaskFn};

/// Progress callbacks
mod report;
pub use report::{NoopReporter, Reporter};

/// The pipeline itself
mod pipeline;
pub use pipeline::{PipelineError, RunReport, TaskOutcome, TaskPipeline, TaskState};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Context key \"{0}\" has not been set by an earlier task")]
    MissingKey(String),
    #[error("Context key \"{0}\" does not hold a string")]
    NotAString(String),
}
