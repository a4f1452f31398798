//! Task lists that set up an org for the project.
//!
//! Both flows share the tail end (query profile, patch User.json, create the agent
//! user, assign permissions); they differ in how the org is obtained and in how
//! tolerant they are of permission sets that are already assigned.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use pipeline::{ShellOptions, SuppressPolicy, Task};

use crate::project::{Project, AGENT_USERNAME_BASE, USER_JSON};
use crate::settings::Settings;
use crate::sfdx::{self, json_command};
use crate::user_json::{self, AgentUser};
use crate::username::{community_nickname, unique_username};

/// Set up an existing org
mod org_env;
pub use org_env::build_org_env;

/// Create and set up a new scratch org
mod scratch_env;
pub use scratch_env::build_scratch_env;

/// Context key holding the Einstein Agent User profile id.
pub const PROFILE_ID: &str = "profileId";

const PROFILE_QUERY: &str = "sf data query -q \"SELECT Id FROM Profile WHERE Name='Einstein Agent User'\"";
const PROFILE_QUERY_TITLE: &str = "Query for Einstein Agent User profile ID";

/// Everything the task lists need to know, decided before any task runs.
#[derive(Debug, Clone)]
pub struct Environment {
    pub agent_username: String,
    pub agent_nickname: String,
    /// Absolute path of `data-import/User.json`.
    pub user_json: PathBuf,
    pub dev_org_alias: String,
    /// Scratch org definition file name, relative to `config/`.
    pub scratch_def: String,
    pub browser: String,
    pub timeout: Option<Duration>,
}

impl Environment {
    /// `stamp` makes the agent username unique; usually the current time in ms.
    pub fn new(project: &Project, settings: &Settings, stamp: u128) -> Self {
        let agent_username = unique_username(AGENT_USERNAME_BASE, stamp);
        let agent_nickname = community_nickname(&agent_username);
        log::debug!("agent username: {agent_username}");
        Self {
            agent_username,
            agent_nickname,
            user_json: project.user_json_path(),
            dev_org_alias: project.dev_org_alias(),
            scratch_def: settings.scratch_def.clone(),
            browser: settings.browser.clone(),
            timeout: settings.timeout,
        }
    }

    /// A task running the `sf` command `command` with JSON output.
    fn sf(&self, title: impl Into<String>, command: &str, options: ShellOptions) -> Task {
        Task::shell(title, json_command(command), options.timeout(self.timeout))
    }

    // SHARED TASKS ///////////////////

    /// Without these, AiAuthoringBundle deployment fails validation because it can't
    /// see the GenAiPromptTemplate metadata that's already in the org.
    fn assign_prompt_template_perms(&self, options: ShellOptions) -> Task {
        self.sf(
            "Assign Prompt Template perm sets",
            "sf org assign permset -n EinsteinGPTPromptTemplateManager -n EinsteinGPTPromptTemplateUser",
            options,
        )
    }

    fn deploy_source(&self, command: &str) -> Task {
        self.sf("Deploy project source", command, sfdx::strict())
    }

    fn query_profile_id(&self) -> Task {
        let options = sfdx::strict().on_success(|output, ctx, status| {
            let profile_id = sfdx::first_record_id(output).context("while reading profile query result")?;
            status.set(format!("{PROFILE_QUERY_TITLE} ({profile_id})"));
            ctx.insert(PROFILE_ID, profile_id);
            Ok(())
        });
        self.sf(PROFILE_QUERY_TITLE, PROFILE_QUERY, options)
    }

    fn update_user_json(&self) -> Task {
        let path = self.user_json.clone();
        let username = self.agent_username.clone();
        let community_nickname = self.agent_nickname.clone();
        Task::func(format!("Update User.json ({username})"), move |ctx, _| {
            let user = AgentUser {
                profile_id: ctx.require_str(PROFILE_ID)?.to_owned(),
                username,
                community_nickname,
            };
            user_json::patch_file(&path, &user)
        })
    }

    fn create_agent_user(&self) -> Task {
        self.sf(
            format!("Create agent user ({})", self.agent_username),
            &format!("sf data import tree --files {USER_JSON}"),
            sfdx::strict(),
        )
    }

    fn assign_user_perms(&self, suppress: SuppressPolicy) -> Task {
        self.sf(
            "Assign \"AFDX_User_Perms\" to admin user",
            "sf org assign permset -n AFDX_User_Perms",
            sfdx::strict().suppress(suppress),
        )
    }

    fn assign_agent_perms(&self, suppress: SuppressPolicy) -> Task {
        self.sf(
            format!("Assign \"AFDX_Agent_Perms\" to {}", self.agent_username),
            &format!("sf org assign permset -n AFDX_Agent_Perms -b {}", self.agent_username),
            sfdx::strict().suppress(suppress),
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use super::Environment;

    pub const PROFILE_JSON: &str =
        r#"{"status": 0, "result": {"records": [{"attributes": {"type": "Profile"}, "Id": "00e123"}], "totalSize": 1}}"#;

    pub fn env(user_json: PathBuf) -> Environment {
        Environment {
            agent_username: "afdx-agent.1700000000000@testdrive.org".into(),
            agent_nickname: "afdx-agent.1700000000000".into(),
            user_json,
            dev_org_alias: "SCRATCH:afdx".into(),
            scratch_def: "afdx-scratch-def.json".into(),
            browser: "firefox".into(),
            timeout: None,
        }
    }
}
