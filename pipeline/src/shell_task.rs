use std::fmt;
use std::time::Duration;

use anyhow::{Context as _, Result};

use crate::shell::{CapturedStdio, CommandError, CommandFailure, CommandOutput, ShellExecutor};
use crate::{Context, StatusLine};

/// Called with the output of a command that exited 0.
/// May write to the context and update the task's status line.
pub type OnSuccess = Box<dyn FnOnce(&CommandOutput, &mut Context, &mut StatusLine) -> Result<()>>;

/// Decides whether a particular failure is harmless.
pub type SuppressPredicate = Box<dyn Fn(&CommandFailure) -> bool>;

/// What to do when a command exits with a non-zero code.
#[derive(Default)]
pub enum SuppressPolicy {
    /// Every failure is non-fatal.
    Always,
    /// Every failure aborts the pipeline.
    #[default]
    Never,
    /// Failures for which the predicate returns true are non-fatal.
    If(SuppressPredicate),
}

impl SuppressPolicy {
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&CommandFailure) -> bool + 'static,
    {
        Self::If(Box::new(predicate))
    }

    pub fn suppresses(&self, failure: &CommandFailure) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::If(predicate) => predicate(failure),
        }
    }
}

impl From<bool> for SuppressPolicy {
    fn from(suppress: bool) -> Self {
        if suppress {
            Self::Always
        } else {
            Self::Never
        }
    }
}

impl fmt::Debug for SuppressPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::If(_) => f.write_str("If(..)"),
        }
    }
}

/// Options recognized by a [`ShellCommandTask`].
#[derive(Default)]
pub struct ShellOptions {
    pub suppress: SuppressPolicy,
    /// Include captured stdout/stderr in the error when the command fails.
    pub render_stdio_on_error: bool,
    pub on_success: Option<OnSuccess>,
    /// Kill the command if it runs longer than this. No limit if `None`.
    pub timeout: Option<Duration>,
}

impl ShellOptions {
    pub fn suppress<P: Into<SuppressPolicy>>(mut self, policy: P) -> Self {
        self.suppress = policy.into();
        self
    }

    pub fn render_stdio_on_error(mut self) -> Self {
        self.render_stdio_on_error = true;
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&CommandOutput, &mut Context, &mut StatusLine) -> Result<()> + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ShellOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellOptions")
            .field("suppress", &self.suppress)
            .field("render_stdio_on_error", &self.render_stdio_on_error)
            .field("on_success", &self.on_success.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// How a task finished, if it didn't abort the pipeline.
#[derive(Debug)]
pub(crate) enum Completion {
    Done,
    Suppressed(CommandError),
}

/// A task that runs one external command.
#[derive(Debug)]
pub struct ShellCommandTask {
    command: String,
    options: ShellOptions,
}

impl ShellCommandTask {
    pub fn new<T: Into<String>>(command: T, options: ShellOptions) -> Self {
        Self {
            command: command.into(),
            options,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    /// Run the command and apply the success/suppression rules.
    pub(crate) fn execute(
        self,
        shell: &dyn ShellExecutor,
        ctx: &mut Context,
        status: &mut StatusLine,
    ) -> Result<Completion> {
        let Self { command, options } = self;
        let output = shell.run(&command, options.timeout)?;

        if output.success() {
            if let Some(on_success) = options.on_success {
                on_success(&output, ctx, status)
                    .with_context(|| format!("while handling the output of `{command}`"))?;
            }
            return Ok(Completion::Done);
        }

        let failure = CommandFailure {
            command: &command,
            output: &output,
        };
        let suppressed = options.suppress.suppresses(&failure);
        let stdio = options.render_stdio_on_error.then(|| CapturedStdio {
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
        });
        let e = CommandError::CommandFailed {
            command,
            exit_code: output.exit_code,
            stdio,
        };

        if suppressed {
            log::info!("suppressed failure: {e}");
            Ok(Completion::Suppressed(e))
        } else {
            Err(e.into())
        }
    }
}
