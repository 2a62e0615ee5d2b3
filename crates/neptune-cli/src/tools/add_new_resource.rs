use super::{required_str, to_json, NeptuneTool, ToolCtx};
use neptune_core::models::ResourceKind;
use neptune_core::resources;

pub struct AddNewResourceTool;

impl NeptuneTool for AddNewResourceTool {
    fn name(&self) -> &str {
        "add_new_resource"
    }

    fn description(&self) -> &str {
        "Get information about a resource kind that can be provisioned on Neptune. Always use \
         this before adding a resource to neptune.json."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "kind": {
                    "type": "string",
                    "enum": ["Database", "StorageBucket", "Secret"],
                    "description": "Resource kind"
                }
            },
            "required": ["kind"]
        })
    }

    fn call(&self, args: serde_json::Value, _ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let kind: ResourceKind = required_str(&args, "kind")?
            .parse()
            .map_err(|e: neptune_core::NeptuneError| e.to_string())?;
        let access = match &kind {
            ResourceKind::Secret => "3. Use 'set_secret_value' to set the secret's value",
            ResourceKind::StorageBucket => "3. Use 'get_bucket_connection_info' for the bucket id",
            ResourceKind::Database => "3. Read connection details from the environment",
            ResourceKind::Other(_) => "3. Check 'get_project_schema' for how to use it",
        };
        let next_steps = [
            format!("1. Add the {kind} to neptune.json"),
            "2. Run 'provision_resources'".to_string(),
            access.to_string(),
            "4. Run 'deploy_project'".to_string(),
        ];
        let mut out = to_json(&resources::resource_info(kind))?;
        out["next_steps"] = serde_json::json!(next_steps);
        Ok(out)
    }
}
