use super::{neptune_json_path_schema, project_dir, to_json, NeptuneTool, ToolCtx};
use neptune_core::deploy::{DeployOptions, Deployer, Unattended};
use neptune_core::docker::SystemDocker;

pub struct DeployProjectTool;

impl NeptuneTool for DeployProjectTool {
    fn name(&self) -> &str {
        "deploy_project"
    }

    fn description(&self) -> &str {
        "Build the project's Docker image, push it and deploy it. Runs preflight checks, spec \
         generation, AI lint, provisioning and the status checks. Containers are not \
         persistent; use provisioned resources for data."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "neptune_json_path": neptune_json_path_schema(),
                "skip_spec": {
                    "type": "boolean",
                    "description": "Use the existing neptune.json instead of regenerating it"
                },
                "skip_lint": { "type": "boolean", "description": "Skip AI lint" },
                "allow_ai_errors": {
                    "type": "boolean",
                    "description": "Do not block on AI lint errors"
                },
                "allow_ai_warnings": {
                    "type": "boolean",
                    "description": "Do not block on AI lint warnings"
                }
            }
        })
    }

    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String> {
        let dir = project_dir(&args, ctx);
        let flag = |k: &str| args[k].as_bool().unwrap_or(false);
        let opts = DeployOptions {
            skip_spec: flag("skip_spec"),
            skip_lint: flag("skip_lint"),
            allow_ai_errors: flag("allow_ai_errors"),
            allow_ai_warnings: flag("allow_ai_warnings"),
        };

        let client = ctx.client()?;
        let docker = SystemDocker::new();
        let outcome = Deployer::new(&client, &docker).run(&dir, &opts, &mut Unattended);

        let value = to_json(&outcome)?;
        if outcome.ok {
            Ok(value)
        } else {
            Err(serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?)
        }
    }
}
