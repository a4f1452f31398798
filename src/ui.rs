use std::cell::RefCell;
use std::io::BufRead;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use pipeline::{CommandError, Reporter, Task, TaskOutcome, TaskState};

use crate::settings::Settings;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No answer to the confirmation prompt (stdin is closed)")]
    NoAnswer,
}

/// All interactions with the text UI should go through this struct.
pub struct Ui {
    /// -v setting, displays extra text info to user
    pub verbose: bool,
    /// --confirm setting; without it, nothing prompts the user
    ask_first: bool,
    /// buffer to hold strings internally when getting input
    strbuf: RefCell<String>,
}

impl Ui {
    pub fn new(settings: &Settings) -> Self {
        Self {
            verbose: settings.verbose > 0,
            ask_first: settings.confirm,
            // Refcell so we can call confirm() w/o needing a unique reference:
            strbuf: RefCell::new(String::with_capacity(16)),
        }
    }

    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if !self.ask_first {
            return Ok(true);
        }
        eprintln!("{} (y/N)", prompt);
        self.read_answer(std::io::stdin().lock())
    }

    fn read_answer<R: BufRead>(&self, mut input: R) -> Result<bool> {
        let mut strbuf = self.strbuf.borrow_mut();

        strbuf.clear();
        if input.read_line(&mut strbuf)? == 0 {
            return Err(Error::NoAnswer.into());
        }
        match strbuf.trim_start().chars().next() {
            Some('y') | Some('Y') => Ok(true),
            _ => Ok(false),
        }
    }

    pub fn verbose_msg(&self, msg: &str) {
        if self.verbose {
            eprintln!("{}", msg);
        }
    }

    /// Print the list of tasks about to run.
    pub fn print_plan(&self, label: &str, tasks: &[Task]) {
        eprintln!("\nThe following tasks {} {}:", "will run".green(), label);
        for (i, task) in tasks.iter().enumerate() {
            eprintln!("{:>3}. {}", i + 1, task.name());
            if self.verbose {
                if let Some(command) = task.command() {
                    eprintln!("     {}", command.dimmed());
                }
            }
        }
        eprintln!();
    }
}

impl Reporter for Ui {
    fn task_started(&mut self, index: usize, total: usize, status_line: &str) {
        eprintln!("{} [{}/{total}] {status_line}", "RUN".magenta(), index + 1);
    }

    fn task_succeeded(&mut self, status_line: &str, elapsed: Duration) {
        if self.verbose {
            eprintln!("{} {status_line} ({elapsed:.1?})", "DONE".green());
        } else {
            eprintln!("{} {status_line}", "DONE".green());
        }
    }

    fn task_suppressed(&mut self, status_line: &str, error: &CommandError) {
        eprintln!("{} {status_line}", "SUPPRESSED".yellow());
        self.verbose_msg(&format!("  {}", error.to_string().yellow()));
    }

    fn task_failed(&mut self, status_line: &str, _error: &anyhow::Error) {
        // the error itself is rendered once, at the top level.
        eprintln!("{} {status_line}", "FAILED".red());
    }

    fn pipeline_completed(&mut self, outcomes: &[TaskOutcome]) {
        let suppressed = outcomes
            .iter()
            .filter(|o| o.state == TaskState::Suppressed)
            .count();
        if suppressed == 0 {
            eprintln!("\n{}\n", "Setup complete.".green());
        } else {
            eprintln!(
                "\n{} ({suppressed} suppressed {})\n",
                "Setup complete.".green(),
                if suppressed == 1 { "failure" } else { "failures" },
            );
        }
    }
}

/// Print an error and its chain of causes to stderr.
pub fn render_error(e: &anyhow::Error) {
    eprint!("\n{}: ", "ERROR".red());
    eprintln!("{}", e);
    for cause in e.chain().skip(1) {
        eprint!("\nCaused by:\n\t");
        eprintln!("{}", cause.to_string().replace('\n', "\n\t"));
    }
    eprintln!();
}
