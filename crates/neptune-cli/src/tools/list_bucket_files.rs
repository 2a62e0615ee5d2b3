use super::{neptune_json_path_schema, required_str, spec_project, NeptuneTool, ToolCtx};
use neptune_core::resources;

pub struct ListBucketFilesTool;

impl NeptuneTool for ListBucketFilesTool {
    fn name(&self) -> &str {
        "list_bucket_files"
    }

    fn description(&self) -> &str {
        "List the object keys in a provisioned storage bucket"
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
        let keys = resources::list_bucket_files(&client, &project, bucket)
            .map_err(|e| e.to_string())?;
        Ok(serde_json::json!({
            "bucket_name": bucket,
            "files": keys,
            "next_step": "use 'get_bucket_object' to read an object"
        }))
    }
}
