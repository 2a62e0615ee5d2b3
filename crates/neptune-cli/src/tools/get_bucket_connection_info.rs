use super::{neptune_json_path_schema, required_str, spec_project, to_json, NeptuneTool, ToolCtx};
use neptune_core::resources::{self, BucketConnection};

pub struct GetBucketConnectionInfoTool;

impl NeptuneTool for GetBucketConnectionInfoTool {
    fn name(&self) -> &str {
        "get_bucket_connection_info"
    }

    fn description(&self) -> &str {
        "Get the bucket id (aws_id) and region needed to use a provisioned storage bucket. \
         AWS credentials are injected into the deployed application automatically."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "neptune_json_path": neptune_json_path_schema(),
                "bucket_name": { "type": "string", "description": "Bucket name from neptune.json" }
            },
            "required": ["bucket_name"]
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let bucket = required_str(&args, "bucket_name")?;
        let (_, project) = spec_project(&args, ctx)?;
        let client = ctx.client()?;
        let conn = resources::bucket_connection_info(&client, &project, bucket)
            .map_err(|e| e.to_string())?;

        let mut out = to_json(&conn)?;
        match &conn {
            BucketConnection::Ready { bucket_id, .. } => {
                out["auto_injected_credentials"] = serde_json::json!({
                    "AWS_ACCESS_KEY_ID": "Automatically injected into your deployed application",
                    "AWS_SECRET_ACCESS_KEY": "Automatically injected into your deployed application"
                });
                out["next_steps"] = serde_json::json!([
                    format!(
                        "1. Hardcode '{bucket_id}' as the Bucket parameter in your S3 operations"
                    ),
                    "2. Update your application code to use the bucket",
                    "3. Deploy with 'deploy_project'"
                ]);
            }
            BucketConnection::Pending { state, .. } => {
                out["message"] = format!(
                    "Bucket '{bucket}' is still being provisioned (status: {state})"
                )
                .into();
                out["next_step"] = "wait for provisioning to complete and try again".into();
            }
        }
        Ok(out)
    }
}
