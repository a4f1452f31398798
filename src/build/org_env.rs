use pipeline::{ShellOptions, SuppressPolicy, TaskPipeline};

use super::Environment;

/// Register the tasks that set up an existing org (DE, sandbox, etc.):
/// deploy source, create the agent user, and assign permissions.
pub fn build_org_env(pipeline: &mut TaskPipeline, env: &Environment) {
    log::debug!("building task list for an existing org");
    pipeline
        .add_task(env.assign_prompt_template_perms(
            ShellOptions::default().suppress(SuppressPolicy::Always),
        ))
        .add_task(env.deploy_source("sf project deploy start --source-dir force-app"))
        .add_task(env.query_profile_id())
        .add_task(env.update_user_json())
        .add_task(env.create_agent_user())
        .add_task(env.assign_user_perms(SuppressPolicy::Never))
        .add_task(env.assign_agent_perms(SuppressPolicy::Never));
}
