use super::{neptune_json_path_schema, spec_project, to_json, NeptuneTool, ToolCtx};
use neptune_core::project::{self, ProjectStatus};
use neptune_core::NeptuneError;

pub struct GetDeploymentStatusTool;

/// Tool-facing view of a project's condition.
pub(crate) fn status_json(status: &ProjectStatus) -> Result<serde_json::Value, String> {
    Ok(serde_json::json!({
        "project": status.name,
        "infrastructure_provisioning_status": status.provisioning_state.to_string(),
        "service_running_status": to_json(&status.running_status)?,
        "infrastructure_resources": to_json(&status.resources)?,
        "url": status.url,
        "next_steps": "use this information to monitor the deployment; \
            if there are issues, check the logs and redeploy as necessary"
    }))
}

impl NeptuneTool for GetDeploymentStatusTool {
    fn name(&self) -> &str {
        "get_deployment_status"
    }

    fn description(&self) -> &str {
        "Get the provisioning state, running status and resources of the project"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "neptune_json_path": neptune_json_path_schema() }
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let (_, name) = spec_project(&args, ctx)?;
        let client = ctx.client()?;
        match project::get_project_status(&client, &name) {
            Ok(status) => status_json(&status),
            Err(NeptuneError::ProjectNotFound(_)) => Err(format!(
                "Project '{name}' not found; did you deploy it? Deploy it with 'deploy_project'."
            )),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support;
    use tempfile::TempDir;

    #[test]
    fn reports_running_project() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/project/shop")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(test_support::project_json("shop", "Running", "[]"))
            .create();
        let dir = TempDir::new().unwrap();
        test_support::write_spec(dir.path(), r#"{"kind":"Service","name":"shop"}"#);
        let ctx = test_support::ctx(dir.path(), &server.url());

        let out = GetDeploymentStatusTool.call(serde_json::json!({}), &ctx).unwrap();
        assert_eq!(out["infrastructure_provisioning_status"], "Ready");
        assert_eq!(out["service_running_status"]["current"], "Running");
        assert_eq!(out["url"], "http://203.0.113.7");
    }
}
