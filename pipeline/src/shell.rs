use std::io::{self, stderr, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;

/// How often to check on a child process that has a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output of a finished command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// stdout parsed as JSON, if it was JSON.
    pub stdout_json: Option<Value>,
}

impl CommandOutput {
    pub fn new(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        let stdout_json = parse_json(&stdout);
        Self {
            exit_code,
            stdout,
            stderr,
            stdout_json,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

fn parse_json(stdout: &str) -> Option<Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(value) => Some(value),
        Err(e) => {
            log::trace!("stdout is not json: {e}");
            None
        }
    }
}

/// A command that exited with a non-zero code, as seen by suppression predicates.
#[derive(Debug, Clone, Copy)]
pub struct CommandFailure<'a> {
    pub command: &'a str,
    pub output: &'a CommandOutput,
}

/// stdout and stderr kept for an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedStdio {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unable to start command `{0}`")]
    Spawn(String, #[source] io::Error),
    #[error("{}", describe_failure(.command, .exit_code, .stdio))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdio: Option<CapturedStdio>,
    },
    #[error("Command `{0}` timed out after {1:?}")]
    TimedOut(String, Duration),
    #[error("I/O error while running `{0}`")]
    Io(String, #[source] io::Error),
    #[error("Output reader for `{0}` panicked")]
    ReaderPanicked(String),
}

fn describe_failure(command: &str, exit_code: &Option<i32>, stdio: &Option<CapturedStdio>) -> String {
    let mut msg = match exit_code {
        Some(code) => format!("Command `{command}` failed with exit code {code}"),
        None => format!("Command `{command}` was terminated by a signal"),
    };
    if let Some(stdio) = stdio {
        for (label, text) in [("stdout", &stdio.stdout), ("stderr", &stdio.stderr)] {
            let text = text.trim_end();
            if !text.is_empty() {
                msg.push_str(&format!("\n--- {label} ---\n{text}"));
            }
        }
    }
    msg
}

/// Runs command strings. The pipeline calls all shell commands through this trait,
/// so tests can substitute a scripted implementation.
pub trait ShellExecutor {
    /// Run `command` to completion (or until `timeout` expires) and capture its output.
    /// A non-zero exit is *not* an error here; callers decide what it means.
    fn run(&self, command: &str, timeout: Option<Duration>) -> Result<CommandOutput, CommandError>;
}

/// Runs commands through the platform shell (`sh -c` / `cmd /C`).
///
/// Command strings are passed through untouched: callers are responsible
/// for any quoting, since commands are often composites of several flags.
#[derive(Debug, Default, Clone)]
pub struct SystemShell {
    /// Directory to run commands in; the current dir if `None`.
    current_dir: Option<PathBuf>,
    /// Copy child output to our stderr as it arrives.
    echo: bool,
}

impl SystemShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir<T: AsRef<Path>>(mut self, dir: T) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    fn command(&self, command: &str) -> Command {
        #[cfg(windows)]
        let mut cmd = {
            use std::os::windows::process::CommandExt;
            let mut cmd = Command::new("cmd");
            // cmd.exe doesn't understand `\"` escapes, so the line goes through untouched.
            cmd.arg("/C").raw_arg(command);
            cmd
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl ShellExecutor for SystemShell {
    fn run(&self, command: &str, timeout: Option<Duration>) -> Result<CommandOutput, CommandError> {
        log::debug!("running `{command}`");
        let mut child = self
            .command(command)
            .spawn()
            .map_err(|e| CommandError::Spawn(command.to_owned(), e))?;

        let io_err = |e: io::Error| CommandError::Io(command.to_owned(), e);
        let missing_pipe = || io_err(io::Error::other("child pipe was not captured"));

        let child_out = child.stdout.take().ok_or_else(missing_pipe)?;
        let child_err = child.stderr.take().ok_or_else(missing_pipe)?;

        let echo = self.echo;
        let thread_out = thread::spawn(move || communicate(child_out, echo.then(stderr)));
        let thread_err = thread::spawn(move || communicate(child_err, echo.then(stderr)));

        let status = match timeout {
            Some(limit) => wait_with_timeout(&mut child, limit).map_err(io_err)?,
            None => Some(child.wait().map_err(io_err)?),
        };

        let Some(status) = status else {
            // the readers are left to finish on their own; a grandchild
            // may still be holding the pipes open.
            log::warn!("`{command}` timed out after {timeout:?}; killed");
            return Err(CommandError::TimedOut(
                command.to_owned(),
                timeout.unwrap_or_default(),
            ));
        };

        let stdout = join_reader(thread_out, command)?;
        let stderr = join_reader(thread_err, command)?;

        log::debug!("`{command}` finished with {status}");
        Ok(CommandOutput::new(status.code(), stdout, stderr))
    }
}

/// Read `stream` to the end, optionally teeing it to `output`.
fn communicate<R: Read, W: Write>(mut stream: R, mut output: Option<W>) -> io::Result<String> {
    let mut captured = Vec::with_capacity(1024);
    let mut buf = [0u8; 1024];
    loop {
        let num_read = stream.read(&mut buf)?;
        if num_read == 0 {
            break;
        }

        let buf = &buf[..num_read];
        captured.extend_from_slice(buf);
        if let Some(output) = output.as_mut() {
            output.write_all(buf)?;
        }
    }

    Ok(String::from_utf8_lossy(&captured).into_owned())
}

fn join_reader(handle: JoinHandle<io::Result<String>>, command: &str) -> Result<String, CommandError> {
    handle
        .join()
        .map_err(|_| CommandError::ReaderPanicked(command.to_owned()))?
        .map_err(|e| CommandError::Io(command.to_owned(), e))
}

/// Wait for `child`, killing it if it runs longer than `limit`.
/// Returns `None` if it was killed.
fn wait_with_timeout(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
