use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::{CommandError, CommandOutput, ShellExecutor};

#[derive(Debug, Clone)]
enum Reply {
    Exit(i32, String),
    TimeOut,
}

#[derive(Debug, Default)]
struct Script {
    /// (command prefix, reply); the first matching prefix wins.
    replies: Vec<(String, Reply)>,
    /// Every command run so far, with the timeout it was given.
    ran: Vec<(String, Option<Duration>)>,
}

/// A [`ShellExecutor`] that runs nothing, answering each command from a script.
///
/// Commands that match no scripted prefix exit 0 with empty output.
/// Clones share one script, so a clone can be handed to a pipeline while
/// the original is kept to inspect what ran.
#[derive(Debug, Clone, Default)]
pub struct ScriptedShell {
    script: Rc<RefCell<Script>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands starting with `prefix` exit with `code`, printing `stdout`.
    pub fn respond(&self, prefix: &str, code: i32, stdout: &str) {
        self.push(prefix, Reply::Exit(code, stdout.to_owned()));
    }

    /// Commands starting with `prefix` time out.
    pub fn time_out(&self, prefix: &str) {
        self.push(prefix, Reply::TimeOut);
    }

    fn push(&self, prefix: &str, reply: Reply) {
        self.script.borrow_mut().replies.push((prefix.to_owned(), reply));
    }

    /// Commands run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.script.borrow().ran.iter().map(|(cmd, _)| cmd.clone()).collect()
    }

    /// The timeout passed with each command run so far.
    pub fn timeouts(&self) -> Vec<Option<Duration>> {
        self.script.borrow().ran.iter().map(|(_, timeout)| *timeout).collect()
    }
}

impl ShellExecutor for ScriptedShell {
    fn run(&self, command: &str, timeout: Option<Duration>) -> Result<CommandOutput, CommandError> {
        let mut script = self.script.borrow_mut();
        script.ran.push((command.to_owned(), timeout));

        let reply = script
            .replies
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Exit(0, String::new()));

        match reply {
            Reply::Exit(code, stdout) => Ok(CommandOutput::new(Some(code), stdout, String::new())),
            Reply::TimeOut => Err(CommandError::TimedOut(
                command.to_owned(),
                timeout.unwrap_or_default(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_prefix_wins() -> Result<(), CommandError> {
        let shell = ScriptedShell::new();
        shell.respond("sf org", 1, "first");
        shell.respond("sf org open", 0, "second");

        let output = shell.clone().run("sf org open -b firefox", None)?;
        assert_eq!(output.exit_code, Some(1));
        assert_eq!(output.stdout, "first");

        let output = shell.run("sf project deploy start", Some(Duration::from_secs(3)))?;
        assert!(output.success());
        assert_eq!(shell.commands(), vec!["sf org open -b firefox", "sf project deploy start"]);
        assert_eq!(shell.timeouts(), vec![None, Some(Duration::from_secs(3))]);
        Ok(())
    }

    #[test]
    fn test_time_out() {
        let shell = ScriptedShell::new();
        shell.time_out("sleep");
        let result = shell.run("sleep 100", Some(Duration::from_secs(5)));
        assert!(matches!(
            result,
            Err(CommandError::TimedOut(cmd, limit)) if cmd == "sleep 100" && limit == Duration::from_secs(5)
        ));
    }
}
