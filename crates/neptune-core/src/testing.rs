//! In-memory stand-ins for the platform API and the docker CLI.

use crate::client::PlatformApi;
use crate::docker::{DockerCli, DockerOutput};
use crate::error::{NeptuneError, Result};
use crate::models::{
    AiLintReport, AiSpec, DatabaseConnectionInfo, Deployment, DeploymentStatus, GenerateResponse,
    Project, ProjectSpec, ProvisioningState, ResourceKind, ResourceState, ResourceStatus,
    Revision, RunState, RunningStatus, User,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

pub const STUB_PUBLIC_IP: &str = "203.0.113.10";
pub const STUB_REGISTRY: &str = "registry.example";

// ---------------------------------------------------------------------------
// StubApi
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ApiState {
    calls: HashMap<&'static str, usize>,
    failing: HashSet<&'static str>,
    /// Answers for `get_project`, consumed front to back before `current`.
    scripted: VecDeque<Option<Project>>,
    current: Option<Project>,
    generate: Option<GenerateResponse>,
    lint: AiLintReport,
    revision: u64,
    /// Statuses returned by `get_deployment`; the last one repeats.
    deployment_statuses: VecDeque<DeploymentStatus>,
    logs: Vec<String>,
    secrets: BTreeMap<String, String>,
    bucket_keys: Vec<String>,
    objects: HashMap<String, Vec<u8>>,
    agents_md: Option<String>,
}

#[derive(Default)]
pub struct StubApi {
    state: RefCell<ApiState>,
}

impl StubApi {
    pub fn calls(&self, method: &str) -> usize {
        self.state.borrow().calls.get(method).copied().unwrap_or(0)
    }

    /// Make every later call to `method` fail with a 500.
    pub fn fail(&self, method: &'static str) {
        self.state.borrow_mut().failing.insert(method);
    }

    pub fn script_projects(&self, answers: Vec<Option<Project>>) {
        self.state.borrow_mut().scripted.extend(answers);
    }

    /// Put the project in the fully provisioned state `spec` describes.
    pub fn provision_now(&self, spec: &ProjectSpec) {
        self.state.borrow_mut().current = Some(provisioned(spec));
    }

    pub fn set_generate(&self, resp: GenerateResponse) {
        self.state.borrow_mut().generate = Some(resp);
    }

    pub fn set_lint(&self, report: AiLintReport) {
        self.state.borrow_mut().lint = report;
    }

    pub fn set_deployment_statuses(&self, statuses: Vec<DeploymentStatus>) {
        self.state.borrow_mut().deployment_statuses = statuses.into();
    }

    pub fn set_logs(&self, lines: Vec<String>) {
        self.state.borrow_mut().logs = lines;
    }

    pub fn set_bucket_keys(&self, keys: Vec<String>) {
        self.state.borrow_mut().bucket_keys = keys;
    }

    pub fn set_object(&self, key: &str, data: &[u8]) {
        self.state
            .borrow_mut()
            .objects
            .insert(key.to_string(), data.to_vec());
    }

    pub fn set_agents_md(&self, content: &str) {
        self.state.borrow_mut().agents_md = Some(content.to_string());
    }

    pub fn secret(&self, name: &str) -> Option<String> {
        self.state.borrow().secrets.get(name).cloned()
    }

    fn enter(&self, method: &'static str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        *state.calls.entry(method).or_default() += 1;
        if state.failing.contains(method) {
            return Err(NeptuneError::Api {
                status: 500,
                body: format!("{method} failed"),
            });
        }
        Ok(())
    }
}

fn provisioned(spec: &ProjectSpec) -> Project {
    Project {
        name: spec.name.clone(),
        kind: spec.kind.clone(),
        provisioning_state: ProvisioningState::Ready,
        running_status: RunningStatus::default(),
        resources: spec
            .resources
            .iter()
            .map(|r| ResourceStatus {
                kind: r.kind.clone(),
                name: r.name.clone(),
                status: ResourceState::Available,
                aws_id: Some(format!("{}-{}", spec.name, r.name)),
            })
            .collect(),
    }
}

impl PlatformApi for StubApi {
    fn list_projects(&self) -> Result<Vec<Project>> {
        self.enter("list_projects")?;
        Ok(self.state.borrow().current.iter().cloned().collect())
    }

    fn get_project(&self, name: &str) -> Result<Option<Project>> {
        self.enter("get_project")?;
        let mut state = self.state.borrow_mut();
        if let Some(answer) = state.scripted.pop_front() {
            return Ok(answer);
        }
        Ok(state.current.clone().filter(|p| p.name == name))
    }

    fn create_project(&self, spec: &ProjectSpec) -> Result<()> {
        self.enter("create_project")?;
        self.provision_now(spec);
        Ok(())
    }

    fn update_project(&self, spec: &ProjectSpec) -> Result<()> {
        self.enter("update_project")?;
        let mut state = self.state.borrow_mut();
        let running = state
            .current
            .as_ref()
            .map(|p| p.running_status.clone())
            .unwrap_or_default();
        let mut project = provisioned(spec);
        project.running_status = running;
        state.current = Some(project);
        Ok(())
    }

    fn delete_project(&self, name: &str) -> Result<()> {
        self.enter("delete_project")?;
        let mut state = self.state.borrow_mut();
        if state.current.as_ref().is_some_and(|p| p.name == name) {
            state.current = None;
        }
        Ok(())
    }

    fn create_deployment(&self, project: &str) -> Result<Deployment> {
        self.enter("create_deployment")?;
        let mut state = self.state.borrow_mut();
        state.revision += 1;
        if let Some(p) = state.current.as_mut() {
            p.running_status = RunningStatus {
                current: RunState::Running,
                public_ip: Some(STUB_PUBLIC_IP.to_string()),
            };
        }
        Ok(Deployment {
            revision: state.revision,
            image: format!("{STUB_REGISTRY}/{project}:{}", state.revision),
            push_token: Some("push-token".to_string()),
            status: DeploymentStatus::Created,
        })
    }

    fn get_deployment(&self, project: &str, revision: Revision) -> Result<Deployment> {
        self.enter("get_deployment")?;
        let mut state = self.state.borrow_mut();
        let status = if state.deployment_statuses.len() > 1 {
            state.deployment_statuses.pop_front()
        } else {
            state.deployment_statuses.front().cloned()
        }
        .unwrap_or(DeploymentStatus::Deployed);
        let revision = match revision {
            Revision::Number(n) => n,
            Revision::Latest => state.revision,
        };
        Ok(Deployment {
            revision,
            image: format!("{STUB_REGISTRY}/{project}:{revision}"),
            push_token: None,
            status,
        })
    }

    fn get_logs(&self, _project: &str) -> Result<Vec<String>> {
        self.enter("get_logs")?;
        Ok(self.state.borrow().logs.clone())
    }

    fn set_secret(&self, _project: &str, secret_name: &str, value: &str) -> Result<()> {
        self.enter("set_secret")?;
        self.state
            .borrow_mut()
            .secrets
            .insert(secret_name.to_string(), value.to_string());
        Ok(())
    }

    fn list_bucket_keys(&self, _project: &str, _bucket: &str) -> Result<Vec<String>> {
        self.enter("list_bucket_keys")?;
        Ok(self.state.borrow().bucket_keys.clone())
    }

    fn get_bucket_object(&self, _project: &str, _bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.enter("get_bucket_object")?;
        self.state
            .borrow()
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| NeptuneError::Api {
                status: 404,
                body: format!("no such key: {key}"),
            })
    }

    fn get_database_connection_info(
        &self,
        project: &str,
        database: &str,
    ) -> Result<DatabaseConnectionInfo> {
        self.enter("get_database_connection_info")?;
        Ok(DatabaseConnectionInfo {
            host: format!("{project}-{database}.db.example"),
            port: 5432,
            username: "neptune".to_string(),
            password: "hunter2".to_string(),
            database: database.to_string(),
            connection_string: None,
        })
    }

    fn get_project_schema(&self) -> Result<Value> {
        self.enter("get_project_schema")?;
        Ok(json!({"type": "object", "required": ["name"]}))
    }

    fn get_current_user(&self) -> Result<User> {
        self.enter("get_current_user")?;
        Ok(User {
            id: "user-1".to_string(),
            email: Some("dev@example.com".to_string()),
        })
    }

    fn generate(&self, _archive: Vec<u8>, _project_name: &str) -> Result<GenerateResponse> {
        self.enter("generate")?;
        self.state.borrow().generate.clone().ok_or(NeptuneError::Api {
            status: 503,
            body: "generation unavailable".to_string(),
        })
    }

    fn generate_spec(&self, _archive: Vec<u8>, _project_name: &str) -> Result<AiSpec> {
        self.enter("generate_spec")?;
        self.state
            .borrow()
            .generate
            .as_ref()
            .map(|g| g.platform_spec.clone())
            .ok_or(NeptuneError::Api {
                status: 503,
                body: "generation unavailable".to_string(),
            })
    }

    fn lint(&self, _archive: Vec<u8>) -> Result<AiLintReport> {
        self.enter("lint")?;
        Ok(self.state.borrow().lint.clone())
    }

    fn agents_md(&self) -> Result<String> {
        self.enter("agents_md")?;
        self.state.borrow().agents_md.clone().ok_or(NeptuneError::Api {
            status: 404,
            body: "not found".to_string(),
        })
    }
}

/// Project with storage buckets in the given states.
pub fn project_with(name: &str, provisioning: &str, buckets: &[(&str, &str)]) -> Project {
    Project {
        name: name.to_string(),
        kind: "Service".to_string(),
        provisioning_state: ProvisioningState::from(provisioning.to_string()),
        running_status: RunningStatus::default(),
        resources: buckets
            .iter()
            .map(|(res, status)| ResourceStatus {
                kind: ResourceKind::StorageBucket,
                name: res.to_string(),
                status: ResourceState::from(status.to_string()),
                aws_id: None,
            })
            .collect(),
    }
}

/// Provisioned project whose service is in `run_state`.
pub fn project_running(name: &str, run_state: &str, public_ip: Option<&str>) -> Project {
    let mut p = project_with(name, "Ready", &[]);
    p.running_status = RunningStatus {
        current: RunState::from(run_state.to_string()),
        public_ip: public_ip.map(str::to_string),
    };
    p
}

// ---------------------------------------------------------------------------
// StubDocker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DockerCall {
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<Vec<u8>>,
}

#[derive(Default)]
pub struct StubDocker {
    installed_missing: bool,
    daemon_down: bool,
    failing: Option<&'static str>,
    calls: RefCell<Vec<DockerCall>>,
}

impl StubDocker {
    /// `docker <subcommand>` exits non-zero.
    pub fn failing(subcommand: &'static str) -> Self {
        Self {
            failing: Some(subcommand),
            ..Self::default()
        }
    }

    pub fn not_installed() -> Self {
        Self {
            installed_missing: true,
            ..Self::default()
        }
    }

    pub fn daemon_stopped() -> Self {
        Self {
            daemon_down: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<DockerCall> {
        self.calls.borrow().clone()
    }

    /// Recorded subcommands, excluding `--version` and `info` checks.
    pub fn subcommands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| c.args.first().cloned())
            .filter(|s| s != "--version" && s != "info")
            .collect()
    }

    pub fn count(&self, subcommand: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.args.first().map(String::as_str) == Some(subcommand))
            .count()
    }
}

impl DockerCli for StubDocker {
    fn run(
        &self,
        args: &[&str],
        cwd: Option<&Path>,
        stdin: Option<&[u8]>,
    ) -> std::io::Result<DockerOutput> {
        if self.installed_missing {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "docker: not found",
            ));
        }
        self.calls.borrow_mut().push(DockerCall {
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.map(Path::to_path_buf),
            stdin: stdin.map(<[u8]>::to_vec),
        });

        let sub = args.first().copied().unwrap_or("");
        let ok = !(self.daemon_down && sub == "info") && self.failing != Some(sub);
        Ok(DockerOutput {
            success: ok,
            stdout: if ok { format!("{sub} ok") } else { String::new() },
            stderr: if ok { String::new() } else { format!("{sub} failed") },
        })
    }
}
