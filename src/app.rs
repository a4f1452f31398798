use anyhow::{Context, Result};

use pipeline::{RunReport, ShellExecutor, SystemShell, TaskPipeline};

use crate::build::{build_org_env, build_scratch_env, Environment};
use crate::project::Project;
use crate::settings::{Flow, Settings};
use crate::ui::Ui;
use crate::username::timestamp_millis;

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// User interface
    ui: Ui,
    /// Runs the `sf` commands
    shell: Box<dyn ShellExecutor>,
    /// Makes the agent username unique
    stamp: u128,
}

impl App {
    /// Create a new `App` that runs commands in the project directory.
    pub fn new(settings: Settings) -> Self {
        let shell = SystemShell::new()
            .in_dir(&settings.project_dir)
            .echo(settings.verbose > 1);
        Self::with_shell(settings, Box::new(shell))
    }

    /// Create a new `App` that runs commands through `shell`.
    pub fn with_shell(settings: Settings, shell: Box<dyn ShellExecutor>) -> Self {
        let ui = Ui::new(&settings);
        Self {
            settings,
            ui,
            shell,
            stamp: timestamp_millis(),
        }
    }

    /// Use a fixed stamp for the agent username instead of the current time.
    pub fn with_stamp(mut self, stamp: u128) -> Self {
        self.stamp = stamp;
        self
    }

    /// Build the task list for the selected flow and run it.
    /// Returns `None` if nothing was run (dry run, or the user declined).
    pub fn run(mut self) -> Result<Option<RunReport>> {
        if !self.settings.debug_namespaces.is_empty() {
            log::debug!(
                "debugging enabled for {}",
                self.settings.debug_namespaces.join(", ")
            );
        }
        self.ui.verbose_msg(&format!(
            "Using project directory {:?}",
            self.settings.project_dir
        ));

        let project = Project::load(&self.settings.project_dir)
            .context("while loading the SFDX project")?;
        log::info!("project name: {}", project.name);
        if let Some(version) = &project.source_api_version {
            log::debug!("source API version: {version}");
        }

        let env = Environment::new(&project, &self.settings, self.stamp);

        let mut pipeline = TaskPipeline::new(self.shell);
        let label = match self.settings.flow {
            Flow::ExistingOrg => {
                build_org_env(&mut pipeline, &env);
                "against the default org".to_owned()
            }
            Flow::ScratchOrg => {
                build_scratch_env(&mut pipeline, &env);
                format!("to build scratch org {}", env.dev_org_alias)
            }
        };

        self.ui.print_plan(&label, pipeline.tasks());
        if self.settings.dry_run || !self.ui.confirm("Proceed?")? {
            return Ok(None);
        }

        let report = pipeline
            .run(&mut self.ui)
            .with_context(|| format!("while running setup {label}"))?;
        Ok(Some(report))
    }
}
