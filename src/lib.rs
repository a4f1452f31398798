/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// Task lists for the two setup flows
mod build;
/// The SFDX project and its constants
mod project;
/// Command-line run settings
mod settings;
/// Salesforce CLI helpers
mod sfdx;
/// Text UI
mod ui;
/// Patching data-import/User.json
mod user_json;
/// Agent username generation
mod username;

// exported for tests:
pub use app::App;
pub use args::Args;
pub use settings::{Flow, Settings};
pub use ui::render_error;

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;

    simple_logging::log_to_stderr(settings.log_level());

    // RUN THE THING /////////////////
    let app = App::new(settings);
    app.run()?;

    Ok(())
}
