use std::path::PathBuf;
use std::time::Duration;

use crate::args::Args;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Project directory \"{0}\" does not exist")]
    ProjectDirNotFound(String),
    #[error("Project path \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Invalid timeout: must be at least one second")]
    ZeroTimeout,
}

/// Which kind of org the setup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The CLI's default org (DE, sandbox, etc.)
    ExistingOrg,
    /// A new scratch org, replacing any previous one.
    ScratchOrg,
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. paths are canonicalized.
#[derive(Debug)]
pub struct Settings {
    pub flow: Flow,
    pub project_dir: PathBuf,
    pub scratch_def: String,
    pub browser: String,
    pub timeout: Option<Duration>,
    /// Ask before running the task list.
    pub confirm: bool,
    pub dry_run: bool,
    pub verbose: u8,
    /// Debug namespaces given with `--debug`.
    pub debug_namespaces: Vec<String>,
}

impl Settings {
    /// Log level implied by `-v` and `--debug`.
    pub fn log_level(&self) -> log::LevelFilter {
        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        if self.debug_namespaces.is_empty() {
            level
        } else {
            level.max(log::LevelFilter::Debug)
        }
    }
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let flow = if args.scratch_org {
            Flow::ScratchOrg
        } else {
            Flow::ExistingOrg
        };

        let project_dir = PathBuf::from(&args.project_dir);
        if !project_dir.exists() {
            return Err(Error::ProjectDirNotFound(args.project_dir).into());
        } else if !project_dir.is_dir() {
            return Err(Error::NotDirectory(args.project_dir).into());
        }
        let project_dir = project_dir.canonicalize()?;

        let timeout = match args.timeout {
            Some(0) => return Err(Error::ZeroTimeout.into()),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let debug_namespaces = args
            .debug
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            flow,
            project_dir,
            scratch_def: args.scratch_def,
            browser: args.browser,
            timeout,
            confirm: args.confirm,
            dry_run: args.dry_run,
            verbose: args.verbose,
            debug_namespaces,
        })
    }
}
