use super::{NeptuneTool, ToolCtx};
use neptune_core::client::PlatformApi;

pub struct GetProjectSchemaTool;

impl NeptuneTool for GetProjectSchemaTool {
    fn name(&self) -> &str {
        "get_project_schema"
    }

    fn description(&self) -> &str {
        "Get the JSON schema for neptune.json. Use it before creating or modifying neptune.json \
         so the configuration is valid."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    fn call(&self, _args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let schema = ctx
            .client()?
            .get_project_schema()
            .map_err(|e| format!("Failed to fetch project schema: {e}; ensure you are logged in"))?;
        Ok(serde_json::json!({
            "schema": schema,
            "purpose": "Use this schema as the authoritative reference \
                when creating or modifying neptune.json files",
            "next_step": "Create a valid neptune.json based on this schema, \
                then use 'provision_resources' to provision the infrastructure"
        }))
    }
}
