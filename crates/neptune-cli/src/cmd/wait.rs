use super::Ctx;
use crate::output::CommandResult;
use neptune_core::poll::PollPolicy;
use neptune_core::{project, NeptuneError};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub fn run(ctx: &Ctx, project_name: Option<String>, timeout: u64) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let name = ctx.project_name(project_name);
    ui.header("Wait for Deployment");
    ui.step("", &format!("Waiting for '{name}' to reach Running state..."));
    ui.step("", &format!("(timeout: {timeout}s)"));

    let client = ctx.client()?;
    let policy = PollPolicy::wait(Duration::from_secs(timeout));
    let status = match project::wait_for_deployment(&client, &name, &policy) {
        Ok(s) => s,
        Err(e) => {
            let (hint, next) = match &e {
                NeptuneError::ProjectNotFound(_) => (
                    "Make sure the project exists. Run 'neptune deploy' first.",
                    "neptune deploy",
                ),
                NeptuneError::DeploymentFailed { .. } => (
                    "Check logs with 'neptune logs' for more details.",
                    "neptune logs",
                ),
                NeptuneError::Timeout { .. } => (
                    "The deployment is still in progress. \
                     Run 'neptune wait' again or increase --timeout.",
                    "neptune wait --timeout <seconds>",
                ),
                _ => ("Make sure you're logged in with 'neptune login'", "neptune status"),
            };
            let mut result = CommandResult::failure(vec![e.to_string(), hint.to_string()], next)
                .with("project", &name);
            if let NeptuneError::DeploymentFailed { state, .. } = &e {
                result = result.with("state", state);
            }
            return ui.finish(&result);
        }
    };

    ui.success("Deployment complete!");
    super::project::render_condition(
        ui,
        &status.provisioning_state,
        &status.running_status.current,
        "",
    );
    if let Some(url) = &status.url {
        ui.step("", &format!("URL: {url}"));
    }

    ui.finish(&CommandResult::success("neptune status").with("status", &status))
}
