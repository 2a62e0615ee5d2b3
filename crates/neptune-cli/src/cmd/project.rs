use super::Ctx;
use crate::output::{CommandResult, Ui};
use clap::Subcommand;
use neptune_core::models::{ProvisioningState, ResourceState, RunState};
use neptune_core::{project, NeptuneError};
use serde_json::json;

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// List all projects in your account
    Projects,
}

/// Infrastructure/service lines shared by `status`, `wait` and `deploy`.
/// Returns whether both are healthy.
pub fn render_condition(
    ui: &Ui,
    state: &ProvisioningState,
    running: &RunState,
    indent: &str,
) -> bool {
    if *state == ProvisioningState::Ready {
        ui.success(&format!("{indent}Infrastructure: {state}"));
    } else {
        ui.step("", &format!("{indent}Infrastructure: {state}"));
    }
    match running {
        RunState::Running => ui.success(&format!("{indent}Service: {running}")),
        RunState::Stopped | RunState::Error => ui.warn(&format!("{indent}Service: {running}")),
        _ => ui.step("", &format!("{indent}Service: {running}")),
    }
    *state == ProvisioningState::Ready && *running == RunState::Running
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

pub fn status(ctx: &Ctx, project_name: Option<String>) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let name = ctx.project_name(project_name);
    ui.header("Status");

    let client = ctx.client()?;
    let status = match project::get_project_status(&client, &name) {
        Ok(s) => s,
        Err(NeptuneError::ProjectNotFound(_)) => {
            ui.warn("Project not found");
            ui.step("", &format!("Project: {name}"));
            ui.info("Run 'neptune deploy' to build and deploy this project");
            let result = CommandResult::failure(
                vec![
                    "Project not found".into(),
                    format!("Project: {name}"),
                    "Run 'neptune deploy' to create and deploy this project".into(),
                ],
                "neptune deploy",
            )
            .with("project", &name);
            return if ui.is_json() {
                ui.finish(&result)
            } else {
                Err(crate::output::Reported.into())
            };
        }
        Err(e) => {
            let result = CommandResult::failure(
                vec![
                    format!("Failed to fetch project status: {e}"),
                    "Make sure you're logged in with 'neptune login'".into(),
                ],
                "neptune login",
            )
            .with("project", &name);
            return ui.finish(&result);
        }
    };

    ui.step("", &format!("Project: {}", status.name));
    ui.step("", &format!("Kind: {}", status.kind));
    let healthy = render_condition(
        ui,
        &status.provisioning_state,
        &status.running_status.current,
        "",
    );
    if !status.resources.is_empty() {
        ui.step("", "Resources:");
        for r in &status.resources {
            let icon = match r.status {
                ResourceState::Available => "✅",
                ResourceState::Pending => "⏳",
                _ => "❌",
            };
            ui.step("", &format!("  {icon} {} {} ({})", r.kind, r.name, r.status));
            if let Some(id) = &r.aws_id {
                ui.step("", &format!("       AWS ID: {id}"));
            }
        }
    }
    if let Some(url) = &status.url {
        ui.step("", &format!("URL: {url}"));
    }
    if healthy {
        ui.success("All systems operational");
    }

    let result = CommandResult::success("neptune status")
        .with("project", &name)
        .with(
            "condition",
            json!({
                "provisioning_state": status.provisioning_state,
                "running_status": status.running_status,
                "resources": status.resources,
            }),
        )
        .with("url", &status.url);
    ui.finish(&result)
}

// ---------------------------------------------------------------------------
// list projects
// ---------------------------------------------------------------------------

pub fn list(ctx: &Ctx, subcommand: ListSubcommand) -> anyhow::Result<()> {
    match subcommand {
        ListSubcommand::Projects => list_projects(ctx),
    }
}

fn list_projects(ctx: &Ctx) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    ui.header("Projects");

    let client = ctx.client()?;
    let projects = match project::list_projects(&client) {
        Ok(p) => p,
        Err(e) => {
            let result = CommandResult::failure(
                vec!["Failed to fetch projects".into(), e.to_string()],
                "neptune list projects",
            );
            return ui.finish(&result);
        }
    };

    if projects.is_empty() {
        ui.info("No projects found");
        ui.info("Run 'neptune deploy' to create and deploy your first project");
    }
    for p in &projects {
        ui.plain("");
        ui.step("", &format!("Project: {}", p.name));
        ui.step("", &format!("  Kind: {}", p.kind));
        ui.step("", &format!("  Resources: {}", p.resource_count));
        ui.step("", &format!("  URL: {}", p.url.as_deref().unwrap_or("-")));
        render_condition(ui, &p.provisioning_state, &p.running_status, "  ");
        ui.detail(&format!(
            "  Tip: run 'neptune status --project-name {}' for details",
            p.name
        ));
    }

    let result = CommandResult::success("neptune status --project-name <name>")
        .message("For more details, run 'neptune status --project-name <name>'")
        .with("projects", &projects);
    ui.finish(&result)
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

pub fn delete(ctx: &Ctx, project_name: Option<String>, yes: bool) -> anyhow::Result<()> {
    let ui = &ctx.ui;
    let name = ctx.project_name(project_name);
    ui.header("Delete");

    let client = ctx.client()?;
    let status = match project::get_project_status(&client, &name) {
        Ok(s) => s,
        Err(NeptuneError::ProjectNotFound(_)) => {
            let result = CommandResult::failure(
                vec![format!("Project '{name}' not found")],
                "neptune list projects",
            );
            return ui.finish(&result);
        }
        Err(e) => {
            let result = CommandResult::failure(
                vec![format!("Failed to get project info: {e}")],
                "neptune delete",
            );
            return ui.finish(&result);
        }
    };

    if !yes && !ui.is_json() {
        ui.step("", &format!("Project: {name}"));
        ui.step("", &format!("Resources: {}", status.resources.len()));
        ui.warn("This will permanently delete the project and all its resources!");
        if !ui.confirm("Are you sure you want to delete this project?", false)? {
            ui.step("", "Aborted");
            return Ok(());
        }
    }

    let result = match project::delete_project(&client, &name) {
        Ok(()) => {
            ui.success(&format!("Project '{name}' deleted successfully"));
            CommandResult::success("neptune list projects")
                .message(format!("Project '{name}' deleted successfully"))
        }
        Err(NeptuneError::ProjectNotFound(_)) => CommandResult::failure(
            vec![format!("Project '{name}' not found")],
            "neptune list projects",
        ),
        Err(e) => CommandResult::failure(
            vec![format!("Failed to delete project: {e}")],
            "neptune delete",
        ),
    };
    ui.finish(&result.with("project", &name))
}
