use std::time::{Duration, Instant};

use anyhow::Result;

use crate::shell_task::Completion;
use crate::task::Action;
use crate::{Context, Reporter, ShellExecutor, ShellOptions, StatusLine, SystemShell, Task};

/// Final state of a task after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Succeeded,
    /// Command failed, but the failure was suppressed.
    Suppressed,
    Failed,
    /// Never started because an earlier task failed.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub name: String,
    pub status_line: String,
    pub state: TaskState,
    pub elapsed: Duration,
    /// Error message, for suppressed and failed tasks.
    pub message: Option<String>,
}

impl TaskOutcome {
    fn skipped(task: Task) -> Self {
        Self {
            name: task.name,
            status_line: task.status.into_string(),
            state: TaskState::Skipped,
            elapsed: Duration::ZERO,
            message: None,
        }
    }
}

/// Result of a run in which no task failed fatally.
#[derive(Debug)]
pub struct RunReport {
    pub context: Context,
    pub outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    pub fn suppressed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == TaskState::Suppressed)
            .count()
    }
}

/// A task failed and the rest of the pipeline was not run.
#[derive(Debug, thiserror::Error)]
#[error("Task {} of {total} failed: {name}", .index + 1)]
pub struct PipelineError {
    /// zero-based index of the failed task
    pub index: usize,
    pub total: usize,
    pub name: String,
    #[source]
    pub source: anyhow::Error,
    /// One entry per task, including the skipped ones.
    pub outcomes: Vec<TaskOutcome>,
}

/// An ordered list of tasks sharing one [`Context`], run strictly in sequence.
///
/// Task N+1 never starts before task N has finished, since later tasks
/// routinely depend on files, org state, or context values left by earlier ones.
pub struct TaskPipeline {
    tasks: Vec<Task>,
    context: Context,
    shell: Box<dyn ShellExecutor>,
}

impl TaskPipeline {
    /// Create an empty pipeline that runs shell tasks through `shell`.
    pub fn new(shell: Box<dyn ShellExecutor>) -> Self {
        Self {
            tasks: Vec::with_capacity(16),
            context: Context::new(),
            shell,
        }
    }

    /// Create an empty pipeline that runs shell tasks in the current directory.
    pub fn with_system_shell() -> Self {
        Self::new(Box::new(SystemShell::new()))
    }

    /// Start the run with `context` instead of an empty one.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn add_task(&mut self, task: Task) -> &mut Self {
        log::trace!("adding task {:?}", task.name());
        self.tasks.push(task);
        self
    }

    pub fn add_shell<T: Into<String>, U: Into<String>>(
        &mut self,
        title: T,
        command: U,
        options: ShellOptions,
    ) -> &mut Self {
        self.add_task(Task::shell(title, command, options))
    }

    pub fn add_fn<T, F>(&mut self, title: T, f: F) -> &mut Self
    where
        T: Into<String>,
        F: FnOnce(&mut Context, &mut StatusLine) -> Result<()> + 'static,
    {
        self.add_task(Task::func(title, f))
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task in registration order.
    ///
    /// Stops at the first failure that isn't suppressed, returning a
    /// [`PipelineError`] that says which task failed and why.
    pub fn run(self, reporter: &mut dyn Reporter) -> Result<RunReport, PipelineError> {
        let Self {
            tasks,
            mut context,
            shell,
        } = self;

        let total = tasks.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut remaining = tasks.into_iter().enumerate();

        while let Some((index, task)) = remaining.next() {
            let Task {
                name,
                mut status,
                action,
            } = task;

            log::debug!("starting task {}/{total}: {name}", index + 1);
            reporter.task_started(index, total, status.as_str());
            let start = Instant::now();

            let result = match action {
                Action::Shell(cmd) => cmd.execute(shell.as_ref(), &mut context, &mut status),
                Action::Func(f) => f(&mut context, &mut status).map(|()| Completion::Done),
            };
            let elapsed = start.elapsed();

            let mut outcome = TaskOutcome {
                name,
                status_line: String::new(),
                state: TaskState::Succeeded,
                elapsed,
                message: None,
            };

            match result {
                Ok(Completion::Done) => {
                    reporter.task_succeeded(status.as_str(), elapsed);
                }
                Ok(Completion::Suppressed(e)) => {
                    reporter.task_suppressed(status.as_str(), &e);
                    outcome.state = TaskState::Suppressed;
                    outcome.message = Some(e.to_string());
                }
                Err(source) => {
                    log::debug!("task {} failed: {source:?}", outcome.name);
                    reporter.task_failed(status.as_str(), &source);
                    outcome.state = TaskState::Failed;
                    outcome.message = Some(format!("{source:#}"));
                    outcome.status_line = status.into_string();

                    let name = outcome.name.clone();
                    outcomes.push(outcome);
                    outcomes.extend(remaining.by_ref().map(|(_, task)| TaskOutcome::skipped(task)));

                    return Err(PipelineError {
                        index,
                        total,
                        name,
                        source,
                        outcomes,
                    });
                }
            }

            outcome.status_line = status.into_string();
            outcomes.push(outcome);
        }

        reporter.pipeline_completed(&outcomes);
        Ok(RunReport { context, outcomes })
    }
}
