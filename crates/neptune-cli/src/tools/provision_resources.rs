use super::{neptune_json_path_schema, project_dir, to_json, NeptuneTool, ToolCtx};
use neptune_core::models::ResourceKind;
use neptune_core::poll::PollPolicy;
use neptune_core::provision;
use std::collections::BTreeMap;

pub struct ProvisionResourcesTool;

impl NeptuneTool for ProvisionResourcesTool {
    fn name(&self) -> &str {
        "provision_resources"
    }

    fn description(&self) -> &str {
        "Provision the cloud resources declared in neptune.json and wait until they are ready"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "neptune_json_path": neptune_json_path_schema() }
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let dir = project_dir(&args, ctx);
        let client = ctx.client()?;
        let res = provision::provision(&client, &dir, &PollPolicy::PROVISIONING)
            .map_err(|e| e.to_string())?;

        let bucket_ids: BTreeMap<&str, &str> = res
            .resources
            .iter()
            .filter(|r| r.kind == ResourceKind::StorageBucket)
            .filter_map(|r| r.aws_id.as_deref().map(|id| (r.name.as_str(), id)))
            .collect();

        let mut out = serde_json::json!({
            "infrastructure_status": "ready",
            "project": res.project.name,
            "created": res.created,
            "message": "all the resources required by the project have been provisioned, \
                and it is ready for deployment",
            "infrastructure_resources": to_json(&res.resources)?,
        });
        if bucket_ids.is_empty() {
            out["next_step"] = "deploy the project using 'deploy_project'".into();
        } else {
            out["storage_bucket_ids"] = to_json(&bucket_ids)?;
            out["bucket_usage_instructions"] = "Use the 'aws_id' values as the Bucket parameter \
                in S3 operations. AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY are injected \
                into the deployed application automatically."
                .into();
            out["next_step"] =
                "hardcode the bucket ids in your code, then run 'deploy_project'".into();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support;
    use tempfile::TempDir;

    #[test]
    fn creates_project_and_reports_bucket_ids() {
        let mut server = mockito::Server::new();
        let ready = test_support::project_json(
            "shop",
            "Stopped",
            r#"[{"kind":"StorageBucket","name":"uploads",
                 "status":"Available","aws_id":"shop-uploads"}]"#,
        );
        // Served first: the project does not exist yet.
        let missing = server.mock("GET", "/project/shop").with_status(404).expect(1).create();
        let create = server.mock("POST", "/project").with_status(201).create();
        let found = server
            .mock("GET", "/project/shop")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ready)
            .expect_at_least(1)
            .create();

        let dir = TempDir::new().unwrap();
        test_support::write_spec(
            dir.path(),
            r#"{"kind":"Service","name":"shop",
                "resources":[{"kind":"StorageBucket","name":"uploads"}]}"#,
        );
        let ctx = test_support::ctx(dir.path(), &server.url());

        let tool = ProvisionResourcesTool;
        let out = tool.call(serde_json::json!({}), &ctx).unwrap();

        missing.assert();
        create.assert();
        found.assert();
        assert_eq!(out["created"], true);
        assert_eq!(out["storage_bucket_ids"]["uploads"], "shop-uploads");
    }

    #[test]
    fn missing_spec_is_error() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::ctx(dir.path(), "http://127.0.0.1:9");
        let err = ProvisionResourcesTool.call(serde_json::json!({}), &ctx).unwrap_err();
        assert!(err.contains("neptune.json"));
    }
}
