use super::{neptune_json_path_schema, spec_project, NeptuneTool, ToolCtx};
use neptune_core::{project, NeptuneError};

pub struct DeleteProjectTool;

impl NeptuneTool for DeleteProjectTool {
    fn name(&self) -> &str {
        "delete_project"
    }

    fn description(&self) -> &str {
        "Permanently delete a project and all its resources, including buckets and secrets. \
         This cannot be undone."
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
        match project::delete_project(&client, &name) {
            Ok(()) => Ok(serde_json::json!({
                "status": "success",
                "message": format!(
                    "Project '{name}' and all its resources have been permanently deleted."
                )
            })),
            Err(NeptuneError::ProjectNotFound(_)) => Err(format!(
                "Project '{name}' not found. Check the project name and try again."
            )),
            Err(e) => Err(format!("Failed to delete project '{name}': {e}")),
        }
    }
}
