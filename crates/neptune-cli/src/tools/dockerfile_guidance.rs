use super::{neptune_json_path_schema, project_dir, to_json, NeptuneTool, ToolCtx};
use neptune_core::dockerfile;

pub struct DockerfileGuidanceTool;

impl NeptuneTool for DockerfileGuidanceTool {
    fn name(&self) -> &str {
        "dockerfile_guidance"
    }

    fn description(&self) -> &str {
        "Detect the project type and return an example Dockerfile with requirements and best \
         practices. Use it when deploy reports a missing Dockerfile."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "neptune_json_path": neptune_json_path_schema() }
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let dir = project_dir(&args, ctx);
        let guidance = dockerfile::guidance(&dir);
        let status = if guidance.dockerfile_exists {
            "dockerfile_found"
        } else {
            "dockerfile_needed"
        };
        let mut out = to_json(&guidance)?;
        out["status"] = status.into();
        Ok(out)
    }
}
