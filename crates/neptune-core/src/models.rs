use crate::error::{NeptuneError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Server-reported states
// ---------------------------------------------------------------------------

/// String-backed state enum. Known values map to variants; anything the
/// platform adds later lands in `Other` instead of failing deserialization.
macro_rules! platform_state {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $(stringify!($variant) => $name::$variant,)+
                    _ => $name::Other(s),
                }
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($name::$variant => f.write_str(stringify!($variant)),)+
                    $name::Other(s) => f.write_str(s),
                }
            }
        }
    };
}

platform_state! {
    /// Readiness of a project's infrastructure.
    ProvisioningState { Pending, Ready, Error }
}

platform_state! {
    /// Runtime state of the deployed service.
    RunState { Unknown, Running, Stopped, Error }
}

platform_state! {
    ResourceState { Pending, Available, Error }
}

platform_state! {
    DeploymentStatus { Created, Building, Deployed, Error }
}

impl Default for RunState {
    fn default() -> Self {
        RunState::Unknown
    }
}

impl Default for ProvisioningState {
    fn default() -> Self {
        ProvisioningState::Pending
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        ResourceState::Pending
    }
}

impl Default for DeploymentStatus {
    fn default() -> Self {
        DeploymentStatus::Created
    }
}

/// The platform sends `null` for fields it has no value for yet; treat that
/// like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_service_kind<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(service_kind))
}

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// Kinds of resource a project can declare. `Other` holds a kind this
/// client does not know; it is passed to the platform unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Database,
    StorageBucket,
    Secret,
    Other(String),
}

impl ResourceKind {
    /// The kinds the platform provisions.
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Database,
        ResourceKind::StorageBucket,
        ResourceKind::Secret,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Database => "Database",
            ResourceKind::StorageBucket => "StorageBucket",
            ResourceKind::Secret => "Secret",
            ResourceKind::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ResourceKind::Other(_))
    }

    /// Map the AI service's resource vocabulary onto platform kinds.
    /// Unrecognised kinds come back as `Other`.
    pub fn from_ai_kind(kind: &str) -> ResourceKind {
        match kind {
            "ObjectStorageBucket" => ResourceKind::StorageBucket,
            other => ResourceKind::from(other.to_string()),
        }
    }
}

impl From<String> for ResourceKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Database" => ResourceKind::Database,
            "StorageBucket" => ResourceKind::StorageBucket,
            "Secret" => ResourceKind::Secret,
            _ => ResourceKind::Other(s),
        }
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> String {
        match kind {
            ResourceKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse for command-line input: `database`, `bucket`, `storage-bucket`...
impl FromStr for ResourceKind {
    type Err = NeptuneError;

    fn from_str(s: &str) -> Result<Self> {
        let norm: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match norm.as_str() {
            "database" | "db" => Ok(ResourceKind::Database),
            "storagebucket" | "bucket" | "objectstoragebucket" => Ok(ResourceKind::StorageBucket),
            "secret" => Ok(ResourceKind::Secret),
            _ => Err(NeptuneError::UnknownResourceKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Project spec (neptune.json)
// ---------------------------------------------------------------------------

pub const SERVICE_KIND: &str = "Service";

fn service_kind() -> String {
    SERVICE_KIND.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    pub kind: ResourceKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default = "service_kind")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub resources: Vec<ResourceDeclaration>,
}

impl ProjectSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: service_kind(),
            name: name.into(),
            resources: Vec::new(),
        }
    }

    /// `name` is the provisioning identity key; resources are unique per kind+name.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(NeptuneError::InvalidSpec(
                "project name must not be empty".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for r in &self.resources {
            if r.name.trim().is_empty() {
                return Err(NeptuneError::InvalidSpec(format!(
                    "{} resource has an empty name",
                    r.kind
                )));
            }
            if !seen.insert((&r.kind, r.name.as_str())) {
                return Err(NeptuneError::InvalidSpec(format!(
                    "duplicate {} resource '{}'",
                    r.kind, r.name
                )));
            }
        }
        Ok(())
    }

    pub fn has_resource(&self, kind: &ResourceKind, name: &str) -> bool {
        self.resources
            .iter()
            .any(|r| &r.kind == kind && r.name == name)
    }
}

// ---------------------------------------------------------------------------
// Server-side project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current: RunState,
    #[serde(default)]
    pub public_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ResourceState,
    #[serde(default)]
    pub aws_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default = "service_kind", deserialize_with = "null_as_service_kind")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provisioning_state: ProvisioningState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub running_status: RunningStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<ResourceStatus>,
}

impl Project {
    pub fn find_resource(&self, kind: &ResourceKind, name: &str) -> Option<&ResourceStatus> {
        self.resources
            .iter()
            .find(|r| &r.kind == kind && r.name == name)
    }

    pub fn url(&self) -> Option<String> {
        self.running_status
            .public_ip
            .as_ref()
            .map(|ip| format!("http://{ip}"))
    }
}

// ---------------------------------------------------------------------------
// Deployments
// ---------------------------------------------------------------------------

/// Deployment selector for lookups: a concrete revision or the newest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    Number(u64),
    Latest,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Number(n) => write!(f, "{n}"),
            Revision::Latest => f.write_str("latest"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub revision: u64,
    pub image: String,
    #[serde(default, skip_serializing)]
    pub push_token: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: DeploymentStatus,
}

// Hand-written so the push token never ends up in a log line.
impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("revision", &self.revision)
            .field("image", &self.image)
            .field("push_token", &self.push_token.as_ref().map(|_| "<redacted>"))
            .field("status", &self.status)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Misc API payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConnectionInfo {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

impl DatabaseConnectionInfo {
    pub fn connection_string(&self) -> String {
        self.connection_string.clone().unwrap_or_else(|| {
            format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.database
            )
        })
    }
}

// ---------------------------------------------------------------------------
// AI lint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AiLintCategory {
    Architecture,
    ResourceSupport,
    WorkloadSupport,
    ConfigurationInvalid,
    Unknown,
}

impl AiLintCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AiLintCategory::Architecture => "Architecture",
            AiLintCategory::ResourceSupport => "Resource Support",
            AiLintCategory::WorkloadSupport => "Workload Support",
            AiLintCategory::ConfigurationInvalid => "Configuration Invalid",
            AiLintCategory::Unknown => "Other",
        }
    }
}

impl From<String> for AiLintCategory {
    fn from(s: String) -> Self {
        let norm: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect();
        match norm.as_str() {
            "architecture" => AiLintCategory::Architecture,
            "resourcesupport" => AiLintCategory::ResourceSupport,
            "workloadsupport" => AiLintCategory::WorkloadSupport,
            "configurationinvalid" => AiLintCategory::ConfigurationInvalid,
            _ => AiLintCategory::Unknown,
        }
    }
}

impl From<AiLintCategory> for String {
    fn from(c: AiLintCategory) -> String {
        match c {
            AiLintCategory::Architecture => "architecture",
            AiLintCategory::ResourceSupport => "resource_support",
            AiLintCategory::WorkloadSupport => "workload_support",
            AiLintCategory::ConfigurationInvalid => "configuration_invalid",
            AiLintCategory::Unknown => "unknown",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiLintFinding {
    pub category: AiLintCategory,
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiLintSummary {
    #[serde(default)]
    pub blocking: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiLintConfig {
    #[serde(default)]
    pub block_on_warnings: bool,
    #[serde(default)]
    pub suppressed_codes: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiLintReport {
    #[serde(default)]
    pub errors: Vec<AiLintFinding>,
    #[serde(default)]
    pub warnings: Vec<AiLintFinding>,
    #[serde(default)]
    pub suppressed: Vec<AiLintFinding>,
    #[serde(default)]
    pub summary: AiLintSummary,
    #[serde(default)]
    pub config: AiLintConfig,
}

impl AiLintReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.suppressed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AI generation
// ---------------------------------------------------------------------------

/// Resource entry as the AI service names it; `kind` is not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiResource {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSpec {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resources: Vec<AiResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub platform_spec: AiSpec,
    #[serde(default)]
    pub ai_lint_report: Option<AiLintReport>,
    #[serde(default)]
    pub start_command: Option<String>,
}
