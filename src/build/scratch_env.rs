use pipeline::{ShellOptions, SuppressPolicy, TaskPipeline};

use super::Environment;
use crate::project::DEPLOYMENT_STATUS_PAGE;
use crate::sfdx::{self, suppress_duplicate_assignments};

/// Register the tasks that replace the project's DEV scratch org with a new one
/// and set it up.
///
/// Permission set assignments tolerate duplicates here: the new org's admin user
/// may already hold them through the scratch org definition.
pub fn build_scratch_env(pipeline: &mut TaskPipeline, env: &Environment) {
    log::debug!("building task list for scratch org {}", env.dev_org_alias);
    pipeline
        .add_task(env.sf(
            "Delete existing scratch org",
            &format!("sf org delete scratch -p -o {}", env.dev_org_alias),
            ShellOptions::default().suppress(SuppressPolicy::Always),
        ))
        .add_task(env.sf(
            "Create new scratch org",
            &format!(
                "sf org create scratch -d -a {} -f config/{}",
                env.dev_org_alias, env.scratch_def
            ),
            sfdx::strict(),
        ))
        .add_task(env.assign_prompt_template_perms(
            sfdx::strict().suppress(suppress_duplicate_assignments()),
        ))
        .add_task(env.sf(
            "Open the Deployment Status page",
            &format!("sf org open -b {} -p {DEPLOYMENT_STATUS_PAGE}", env.browser),
            ShellOptions::default(),
        ))
        .add_task(env.deploy_source("sf project deploy start"))
        .add_task(env.query_profile_id())
        .add_task(env.update_user_json())
        .add_task(env.create_agent_user())
        .add_task(env.assign_user_perms(suppress_duplicate_assignments()))
        .add_task(env.assign_agent_perms(suppress_duplicate_assignments()));
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use pipeline::{NoopReporter, ScriptedShell, TaskState};
    use tempfile::tempdir;

    use super::*;
    use crate::build::test_support::{env, PROFILE_JSON};
    use crate::user_json::read_first_record;

    const EXPECTED: [&str; 9] = [
        "sf org delete scratch -p -o SCRATCH:afdx --json",
        "sf org create scratch -d -a SCRATCH:afdx -f config/afdx-scratch-def.json --json",
        "sf org assign permset -n EinsteinGPTPromptTemplateManager -n EinsteinGPTPromptTemplateUser --json",
        "sf org open -b firefox -p lightning/setup/DeployStatus/home --json",
        "sf project deploy start --json",
        "sf data query -q \"SELECT Id FROM Profile WHERE Name='Einstein Agent User'\" --json",
        "sf data import tree --files data-import/User.json --json",
        "sf org assign permset -n AFDX_User_Perms --json",
        "sf org assign permset -n AFDX_Agent_Perms -b afdx-agent.1700000000000@testdrive.org --json",
    ];

    const DUPLICATE: &str = r#"{"status": 1, "result": {"successes": [], "failures": [
        {"name": "AFDX_User_Perms", "message": "Duplicate PermissionSetAssignment:  Assignee=005, PermissionSet=0PS"}
    ]}}"#;

    fn user_json_fixture() -> Result<(tempfile::TempDir, std::path::PathBuf)> {
        let dir = tempdir()?;
        let path = dir.path().join("User.json");
        fs::write(&path, r#"{"records": [{"ProfileId": null}]}"#)?;
        Ok((dir, path))
    }

    #[test]
    fn test_task_list() {
        let mut pipeline = TaskPipeline::new(Box::new(ScriptedShell::new()));
        build_scratch_env(&mut pipeline, &env("User.json".into()));
        assert_eq!(pipeline.len(), 10);

        let commands: Vec<_> = pipeline.tasks().iter().filter_map(|t| t.command()).collect();
        assert_eq!(commands, EXPECTED);
        assert_eq!(pipeline.tasks()[6].name(), "Update User.json (afdx-agent.1700000000000@testdrive.org)");
        assert!(pipeline.tasks()[6].command().is_none());
    }

    #[test]
    fn test_missing_old_org_and_duplicates_are_tolerated() -> Result<()> {
        let (_dir, user_json) = user_json_fixture()?;

        let sf = ScriptedShell::new();
        sf.respond("sf org delete scratch", 1, r#"{"status": 1, "name": "NoOrgFound"}"#);
        sf.respond("sf org assign permset -n AFDX_User_Perms", 1, DUPLICATE);
        sf.respond("sf data query", 0, PROFILE_JSON);

        let mut pipeline = TaskPipeline::new(Box::new(sf.clone()));
        build_scratch_env(&mut pipeline, &env(user_json.clone()));
        let report = pipeline.run(&mut NoopReporter)?;

        assert_eq!(sf.commands(), EXPECTED);
        let states: Vec<_> = report.outcomes.iter().map(|o| o.state).collect();
        assert_eq!(states[0], TaskState::Suppressed);
        assert_eq!(states[8], TaskState::Suppressed);
        assert_eq!(report.suppressed_count(), 2);

        let record = read_first_record(&user_json)?;
        assert_eq!(record["ProfileId"], "00e123");
        assert_eq!(record["CommunityNickname"], "afdx-agent.1700000000000");
        Ok(())
    }

    #[test]
    fn test_other_assignment_failure_is_fatal() -> Result<()> {
        let (_dir, user_json) = user_json_fixture()?;

        let sf = ScriptedShell::new();
        sf.respond(
            "sf org assign permset -n EinsteinGPT",
            1,
            r#"{"status": 1, "result": {"failures": [{"message": "Permission set not found"}]}}"#,
        );

        let mut pipeline = TaskPipeline::new(Box::new(sf.clone()));
        build_scratch_env(&mut pipeline, &env(user_json));
        let e = pipeline.run(&mut NoopReporter).unwrap_err();

        assert_eq!(e.index, 2);
        assert_eq!(sf.commands().len(), 3);
        assert!(e.outcomes[3..].iter().all(|o| o.state == TaskState::Skipped));
        Ok(())
    }

    #[test]
    fn test_create_failure_is_fatal() -> Result<()> {
        let (_dir, user_json) = user_json_fixture()?;

        let sf = ScriptedShell::new();
        sf.respond("sf org create scratch", 1, r#"{"status": 1, "message": "No Dev Hub"}"#);

        let mut pipeline = TaskPipeline::new(Box::new(sf.clone()));
        build_scratch_env(&mut pipeline, &env(user_json));
        let e = pipeline.run(&mut NoopReporter).unwrap_err();
        assert_eq!(e.name, "Create new scratch org");
        assert!(format!("{:#}", e.source).contains("No Dev Hub"));
        Ok(())
    }
}
