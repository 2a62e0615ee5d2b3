use super::{neptune_json_path_schema, spec_project, NeptuneTool, ToolCtx};
use neptune_core::project;

pub struct GetLogsTool;

impl NeptuneTool for GetLogsTool {
    fn name(&self) -> &str {
        "get_logs"
    }

    fn description(&self) -> &str {
        "Retrieve the logs of the project's running service"
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
        let logs = project::get_logs(&client, &name).map_err(|e| e.to_string())?;
        Ok(serde_json::json!({
            "project": name,
            "logs": logs,
            "next_step": "use these logs to debug the application; \
                fix any issues and redeploy as necessary"
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support;
    use tempfile::TempDir;

    #[test]
    fn returns_log_lines() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/project/shop/logs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"logs":["listening on :8080","GET / 200"]}"#)
            .create();
        let dir = TempDir::new().unwrap();
        test_support::write_spec(dir.path(), r#"{"kind":"Service","name":"shop"}"#);
        let ctx = test_support::ctx(dir.path(), &server.url());

        let out = GetLogsTool.call(serde_json::json!({}), &ctx).unwrap();
        assert_eq!(out["logs"][1], "GET / 200");
    }
}
