use super::{neptune_json_path_schema, spec_project, to_json, NeptuneTool, ToolCtx};
use neptune_core::lint;

pub struct LintProjectTool;

impl NeptuneTool for LintProjectTool {
    fn name(&self) -> &str {
        "lint_project"
    }

    fn description(&self) -> &str {
        "Run AI lint over the project sources and report findings that would block a deploy"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "neptune_json_path": neptune_json_path_schema(),
                "allow_ai_errors": { "type": "boolean" },
                "allow_ai_warnings": { "type": "boolean" }
            }
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let (dir, project) = spec_project(&args, ctx)?;
        let client = ctx.client()?;
        let report = lint::run_ai_lint(&client, &dir)
            .map_err(|e| format!("Failed to run AI lint: {e}"))?;
        let assessment = lint::assess(
            &report,
            args["allow_ai_errors"].as_bool().unwrap_or(false),
            args["allow_ai_warnings"].as_bool().unwrap_or(false),
        );
        Ok(serde_json::json!({
            "project": project,
            "blocking": assessment.blocking,
            "reasons": assessment.reasons,
            "ai_lint_report": to_json(&report)?,
            "next_step": if assessment.blocking {
                "fix the blocking findings, then run 'lint_project' again"
            } else {
                "deploy the project with 'deploy_project'"
            }
        }))
    }
}
