use super::{neptune_json_path_schema, required_str, spec_project, NeptuneTool, ToolCtx};
use neptune_core::resources;

pub struct SetSecretValueTool;

impl NeptuneTool for SetSecretValueTool {
    fn name(&self) -> &str {
        "set_secret_value"
    }

    fn description(&self) -> &str {
        "Set the value of a provisioned secret. The secret must be declared in neptune.json \
         and provisioned with 'provision_resources' first."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "neptune_json_path": neptune_json_path_schema(),
                "secret_name": { "type": "string", "description": "Secret name from neptune.json" },
                "value": { "type": "string", "description": "Secret value" }
            },
            "required": ["secret_name", "value"]
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let secret = required_str(&args, "secret_name")?;
        let value = required_str(&args, "value")?;
        let (_, project) = spec_project(&args, ctx)?;
        let client = ctx.client()?;
        resources::set_secret_value(&client, &project, secret, value).map_err(|e| e.to_string())?;

        Ok(serde_json::json!({
            "status": "success",
            "message": format!("Secret '{secret}' set successfully for project '{project}'."),
            "next_step": "redeploy the project with 'deploy_project' to use the updated value"
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support;
    use mockito::Matcher;
    use tempfile::TempDir;

    #[test]
    fn sets_declared_secret() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/project/shop")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(test_support::project_json(
                "shop",
                "Running",
                r#"[{"kind":"Secret","name":"API_KEY","status":"Available"}]"#,
            ))
            .create();
        let put = server
            .mock("PUT", "/project/shop/secret")
            .match_body(Matcher::Json(serde_json::json!({
                "secret_name": "API_KEY",
                "secret_string": "s3cr3t"
            })))
            .with_status(200)
            .create();
        let dir = TempDir::new().unwrap();
        test_support::write_spec(dir.path(), r#"{"kind":"Service","name":"shop"}"#);
        let ctx = test_support::ctx(dir.path(), &server.url());

        let out = SetSecretValueTool
            .call(serde_json::json!({"secret_name": "API_KEY", "value": "s3cr3t"}), &ctx)
            .unwrap();
        put.assert();
        assert_eq!(out["status"], "success");
    }

    #[test]
    fn value_is_required() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::ctx(dir.path(), "http://127.0.0.1:9");
        let err = SetSecretValueTool
            .call(serde_json::json!({"secret_name": "API_KEY"}), &ctx)
            .unwrap_err();
        assert_eq!(err, "missing required argument: value");
    }
}
