use super::get_deployment_status::status_json;
use super::{neptune_json_path_schema, spec_project, NeptuneTool, ToolCtx};
use neptune_core::poll::PollPolicy;
use neptune_core::project;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub struct WaitForDeploymentTool;

impl NeptuneTool for WaitForDeploymentTool {
    fn name(&self) -> &str {
        "wait_for_deployment"
    }

    fn description(&self) -> &str {
        "Wait until the project's service is Running. Fails if it stops or errors, or when the \
         timeout passes."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "neptune_json_path": neptune_json_path_schema(),
                "timeout_seconds": {
                    "type": "integer",
                    "description": "Give up after this many seconds (default 300)"
                }
            }
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let (_, name) = spec_project(&args, ctx)?;
        let timeout = args["timeout_seconds"].as_u64().unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = ctx.client()?;
        let status = project::wait_for_deployment(
            &client,
            &name,
            &PollPolicy::wait(Duration::from_secs(timeout)),
        )
        .map_err(|e| e.to_string())?;
        status_json(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support;
    use tempfile::TempDir;

    fn ctx_with(server: &mockito::ServerGuard) -> (TempDir, ToolCtx) {
        let dir = TempDir::new().unwrap();
        test_support::write_spec(dir.path(), r#"{"kind":"Service","name":"shop"}"#);
        let ctx = test_support::ctx(dir.path(), &server.url());
        (dir, ctx)
    }

    #[test]
    fn running_project_returns_immediately() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/project/shop")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(test_support::project_json("shop", "Running", "[]"))
            .create();
        let (_dir, ctx) = ctx_with(&server);

        let out = WaitForDeploymentTool.call(serde_json::json!({}), &ctx).unwrap();
        assert_eq!(out["service_running_status"]["current"], "Running");
    }

    #[test]
    fn stopped_project_fails() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/project/shop")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(test_support::project_json("shop", "Stopped", "[]"))
            .create();
        let (_dir, ctx) = ctx_with(&server);

        let err = WaitForDeploymentTool.call(serde_json::json!({}), &ctx).unwrap_err();
        assert!(err.contains("Stopped"));
    }
}
