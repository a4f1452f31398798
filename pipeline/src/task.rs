use std::fmt;

use anyhow::Result;

use crate::{Context, ShellCommandTask, ShellOptions};

/// A function task. Receives the shared context and its own status line.
pub type TaskFn = Box<dyn FnOnce(&mut Context, &mut StatusLine) -> Result<()>>;

/// The text shown for a task while it runs and after it finishes.
///
/// Starts out as the task's name; a task may rewrite it to show
/// something it discovered (e.g. an id it queried).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine(String);

impl StatusLine {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self(text.into())
    }

    pub fn set<T: Into<String>>(&mut self, text: T) {
        self.0 = text.into();
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) enum Action {
    Shell(ShellCommandTask),
    Func(TaskFn),
}

/// A unit of work in a pipeline. Runs exactly once.
pub struct Task {
    /// Stable identity, used in errors and logs.
    pub(crate) name: String,
    pub(crate) status: StatusLine,
    pub(crate) action: Action,
}

impl Task {
    /// A task that runs `command` in a shell.
    pub fn shell<T: Into<String>, U: Into<String>>(title: T, command: U, options: ShellOptions) -> Self {
        Self::new(title, Action::Shell(ShellCommandTask::new(command, options)))
    }

    /// A task that calls `f`.
    pub fn func<T, F>(title: T, f: F) -> Self
    where
        T: Into<String>,
        F: FnOnce(&mut Context, &mut StatusLine) -> Result<()> + 'static,
    {
        Self::new(title, Action::Func(Box::new(f)))
    }

    fn new<T: Into<String>>(title: T, action: Action) -> Self {
        let name = title.into();
        let status = StatusLine::new(name.clone());
        Self { name, status, action }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status_line(&self) -> &str {
        self.status.as_str()
    }

    /// The command this task runs, if it is a shell task.
    pub fn command(&self) -> Option<&str> {
        match &self.action {
            Action::Shell(shell) => Some(shell.command()),
            Action::Func(_) => None,
        }
    }

    /// The shell options of this task, if it is a shell task.
    pub fn shell_options(&self) -> Option<&ShellOptions> {
        match &self.action {
            Action::Shell(shell) => Some(shell.options()),
            Action::Func(_) => None,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Task");
        s.field("name", &self.name).field("status", &self.status);
        match &self.action {
            Action::Shell(shell) => s.field("shell", shell),
            Action::Func(_) => s.field("func", &".."),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_status_are_separate() {
        let mut task = Task::shell("Deploy", "sf project deploy start", ShellOptions::default());
        assert_eq!(task.name(), "Deploy");
        assert_eq!(task.status_line(), "Deploy");
        assert_eq!(task.command(), Some("sf project deploy start"));

        task.status.set("Deploy (done)");
        assert_eq!(task.name(), "Deploy");
        assert_eq!(task.status_line(), "Deploy (done)");
    }

    #[test]
    fn test_func_task_has_no_command() {
        let task = Task::func("Update", |_, _| Ok(()));
        assert!(task.command().is_none());
        assert!(task.shell_options().is_none());
    }
}
