use super::{neptune_json_path_schema, required_str, spec_project, NeptuneTool, ToolCtx};
use base64::Engine;
use neptune_core::resources;

pub struct GetBucketObjectTool;

/// UTF-8 text as-is; anything else base64-encoded.
pub(crate) fn encode_object(key: &str, data: Vec<u8>) -> serde_json::Value {
    let size = data.len();
    match String::from_utf8(data) {
        Ok(text) => serde_json::json!({
            "key": key, "size": size, "encoding": "utf-8", "content": text
        }),
        Err(e) => serde_json::json!({
            "key": key,
            "size": size,
            "encoding": "base64",
            "content_base64": base64::engine::general_purpose::STANDARD.encode(e.as_bytes())
        }),
    }
}

impl NeptuneTool for GetBucketObjectTool {
    fn name(&self) -> &str {
        "get_bucket_object"
    }

    fn description(&self) -> &str {
        "Fetch one object from a provisioned storage bucket. Text is returned as-is; binary \
         content is base64-encoded."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "neptune_json_path": neptune_json_path_schema(),
                "bucket_name": { "type": "string", "description": "Bucket name from neptune.json" },
                "key": { "type": "string", "description": "Object key" }
            },
            "required": ["bucket_name", "key"]
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let bucket = required_str(&args, "bucket_name")?;
        let key = required_str(&args, "key")?;
        let (_, project) = spec_project(&args, ctx)?;
        let client = ctx.client()?;
        let data = resources::get_bucket_object(&client, &project, bucket, key)
            .map_err(|e| e.to_string())?;
        Ok(encode_object(key, data))
    }
}
