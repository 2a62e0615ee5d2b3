use neptune_core::client::Client;
use neptune_core::config::{ConfigOverrides, EffectiveConfig};
use neptune_core::{paths, spec};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub mod add_new_resource;
pub mod delete_project;
pub mod deploy_project;
pub mod dockerfile_guidance;
pub mod generate_spec;
pub mod get_bucket_connection_info;
pub mod get_bucket_object;
pub mod get_deployment_status;
pub mod get_logs;
pub mod get_project_schema;
pub mod lint_project;
pub mod list_bucket_files;
pub mod login;
pub mod provision_resources;
pub mod set_secret_value;
pub mod wait_for_deployment;

pub trait NeptuneTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> serde_json::Value;
    fn call(&self, args: serde_json::Value, ctx: &ToolCtx) -> Result<serde_json::Value, String>;
}

pub fn all_tools() -> Vec<Box<dyn NeptuneTool>> {
    vec![
        Box::new(get_project_schema::GetProjectSchemaTool),
        Box::new(login::LoginTool),
        Box::new(add_new_resource::AddNewResourceTool),
        Box::new(provision_resources::ProvisionResourcesTool),
        Box::new(delete_project::DeleteProjectTool),
        Box::new(deploy_project::DeployProjectTool),
        Box::new(get_deployment_status::GetDeploymentStatusTool),
        Box::new(get_bucket_connection_info::GetBucketConnectionInfoTool),
        Box::new(set_secret_value::SetSecretValueTool),
        Box::new(list_bucket_files::ListBucketFilesTool),
        Box::new(get_bucket_object::GetBucketObjectTool),
        Box::new(wait_for_deployment::WaitForDeploymentTool),
        Box::new(get_logs::GetLogsTool),
        Box::new(lint_project::LintProjectTool),
        Box::new(generate_spec::GenerateSpecTool),
        Box::new(dockerfile_guidance::DockerfileGuidanceTool),
    ]
}

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// State shared by every tool call within one server session.
pub struct ToolCtx {
    /// Directory used when a call names no `neptune_json_path`.
    pub dir: PathBuf,
    config: RefCell<EffectiveConfig>,
}

impl ToolCtx {
    pub fn new(dir: PathBuf, config: EffectiveConfig) -> Self {
        ToolCtx {
            dir,
            config: RefCell::new(config),
        }
    }

    pub fn config(&self) -> EffectiveConfig {
        self.config.borrow().clone()
    }

    pub fn client(&self) -> Result<Client, String> {
        Client::new(&self.config.borrow()).map_err(|e| e.to_string())
    }

    /// Re-read credentials after they were persisted mid-session.
    pub fn reload_config(&self) {
        *self.config.borrow_mut() = EffectiveConfig::resolve(&ConfigOverrides::default());
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args[key]
        .as_str()
        .ok_or_else(|| format!("missing required argument: {key}"))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

pub(crate) fn neptune_json_path_schema() -> Value {
    serde_json::json!({
        "type": "string",
        "description": "Path to the project's neptune.json \
            (defaults to the server's working directory)"
    })
}

/// Project directory: the parent of `neptune_json_path` when given.
pub(crate) fn project_dir(args: &Value, ctx: &ToolCtx) -> PathBuf {
    match args["neptune_json_path"].as_str() {
        Some(p) => {
            let p = Path::new(p);
            let p = if p.is_absolute() { p.to_path_buf() } else { ctx.dir.join(p) };
            p.parent().map(Path::to_path_buf).unwrap_or_else(|| ctx.dir.clone())
        }
        None => ctx.dir.clone(),
    }
}

/// Directory and project name for tools that act on an existing spec.
pub(crate) fn spec_project(args: &Value, ctx: &ToolCtx) -> Result<(PathBuf, String), String> {
    let dir = project_dir(args, ctx);
    let path = paths::spec_path(&dir);
    match spec::read_spec(&dir).map_err(|e| e.to_string())? {
        Some(s) => Ok((dir, s.name)),
        None => Err(format!(
            "neptune.json not found at {}; make sure a 'neptune.json' file exists there",
            path.display()
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tool_names_are_unique() {
        let tools = all_tools();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn spec_project_reads_name_from_file() {
        let dir = TempDir::new().unwrap();
        test_support::write_spec(dir.path(), r#"{"kind":"Service","name":"shop"}"#);
        let ctx = test_support::ctx(Path::new("/nonexistent"), "http://127.0.0.1:9");
        let path = dir.path().join("neptune.json");

        let (d, name) =
            spec_project(&serde_json::json!({"neptune_json_path": path.to_str().unwrap()}), &ctx)
                .unwrap();
        assert_eq!(d, dir.path());
        assert_eq!(name, "shop");
    }

    #[test]
    fn spec_project_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let ctx = test_support::ctx(dir.path(), "http://127.0.0.1:9");
        let err = spec_project(&serde_json::json!({}), &ctx).unwrap_err();
        assert!(err.contains("neptune.json not found"));
    }
}
