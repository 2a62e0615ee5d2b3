use crate::models::ResourceKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NeptuneError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("{kind} '{name}' not found in project '{project}'")]
    ResourceNotFound {
        project: String,
        kind: ResourceKind,
        name: String,
    },

    #[error("neptune.json not found at {}", .0.display())]
    SpecNotFound(PathBuf),

    #[error("invalid neptune.json: {0}")]
    InvalidSpec(String),

    #[error("Dockerfile not found in project directory")]
    DockerfileNotFound,

    #[error("Docker is not installed or not found in PATH")]
    DockerNotInstalled,

    #[error("Docker daemon is not running")]
    DockerNotRunning,

    #[error("docker login failed: {0}")]
    DockerLogin(String),

    #[error("docker build failed")]
    DockerBuild { output: String },

    #[error("docker push failed: {0}")]
    DockerPush(String),

    #[error("API call failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("unexpected response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("archive size would exceed the {limit} byte limit (reached {size} bytes)")]
    ArchiveTooLarge { limit: u64, size: u64 },

    #[error("Failed to generate spec: {0}")]
    SpecGeneration(String),

    #[error("provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error("Failed to create deployment: {0}")]
    DeploymentCreation(String),

    #[error("deployment of '{project}' failed: service is in '{state}' state")]
    DeploymentFailed { project: String, state: String },

    #[error("timed out after {seconds}s waiting for '{project}' (current state: {state})")]
    Timeout {
        project: String,
        seconds: u64,
        state: String,
    },

    #[error("unknown resource kind '{0}' (expected Database, StorageBucket or Secret)")]
    UnknownResourceKind(String),

    #[error("user config directory not found: set HOME or XDG_CONFIG_HOME")]
    ConfigDirNotFound,

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("git is not installed or not found in PATH")]
    GitNotInstalled,

    #[error("subfolder '{0}' not found in template repository")]
    TemplateSubfolderNotFound(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, NeptuneError>;
