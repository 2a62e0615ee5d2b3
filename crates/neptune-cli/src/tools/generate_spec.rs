use super::{neptune_json_path_schema, project_dir, to_json, NeptuneTool, ToolCtx};
use neptune_core::spec;

pub struct GenerateSpecTool;

impl NeptuneTool for GenerateSpecTool {
    fn name(&self) -> &str {
        "generate_spec"
    }

    fn description(&self) -> &str {
        "Analyze the project sources and write neptune.json, \
         returning the spec and an AI lint report"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "neptune_json_path": neptune_json_path_schema(),
                "project_name": {
                    "type": "string",
                    "description": "Override the detected project name"
                }
            }
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let dir = project_dir(&args, ctx);
        let name = args["project_name"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| spec::resolve_project_name(&dir));
        let client = ctx.client()?;
        let res = spec::resolve_spec(&client, &dir, &name, false, true).map_err(|e| e.to_string())?;

        Ok(serde_json::json!({
            "spec_path": res.spec_path.display().to_string(),
            "changed": res.changed,
            "spec": to_json(&res.spec)?,
            "start_command": res.start_command,
            "warnings": res.warnings,
            "ai_lint_report": to_json(&res.lint_report)?,
            "next_step": "review neptune.json, then run 'provision_resources' or 'deploy_project'"
        }))
    }
}
