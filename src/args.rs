use clap::Parser;

use crate::project::{ALTERNATIVE_BROWSER, DEV_ORG_CONFIG_FILE};

const CMD_NAME: &str = "setup";
const DEFAULT_PROJECT_DIR: &str = ".";

/// Stores our command-line args format.
#[derive(Parser)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Create a fresh scratch org instead of using the default org
    #[arg(long)]
    pub scratch_org: bool,

    /// SFDX project directory
    #[arg(short = 'd', long, value_name = "DIR", default_value = DEFAULT_PROJECT_DIR)]
    #[arg(env = "AFDX_PROJECT_DIR")]
    pub project_dir: String,

    /// Scratch org definition file, relative to the project's config/ dir
    #[arg(long, value_name = "FILE", default_value = DEV_ORG_CONFIG_FILE)]
    pub scratch_def: String,

    /// Browser used to open the scratch org
    #[arg(long, value_name = "NAME", default_value = ALTERNATIVE_BROWSER)]
    pub browser: String,

    /// Kill any single command that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    #[arg(env = "AFDX_COMMAND_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Show the task list and ask before running it
    #[arg(short, long)]
    pub confirm: bool,

    /// Dry run; print the tasks but don't run them.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print additional debugging info (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Comma-separated debug namespaces, e.g. "Setup,BuildOrgEnv"
    #[arg(long, value_name = "NAMESPACES")]
    pub debug: Option<String>,
}

