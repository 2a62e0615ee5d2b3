use crate::config::EffectiveConfig;
use crate::error::{NeptuneError, Result};
use crate::models::{
    AiLintReport, AiSpec, DatabaseConnectionInfo, Deployment, GenerateResponse, Project,
    ProjectSpec, Revision, User,
};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const CLI_VERSION_HEADER: &str = "X-Neptune-CLI-Version";
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

const API_TIMEOUT: Duration = Duration::from_secs(60);
/// Project analysis on the AI service is slow.
const AI_TIMEOUT: Duration = Duration::from_secs(300);

const ARCHIVE_FIELD: &str = "project";
const ARCHIVE_FILENAME: &str = "proj.zip";

// ---------------------------------------------------------------------------
// Remote operations
// ---------------------------------------------------------------------------

/// Every call the CLI makes to the platform API and the AI service.
///
/// Services take `&dyn PlatformApi` so tests can substitute an in-memory stub.
pub trait PlatformApi {
    // Projects
    fn list_projects(&self) -> Result<Vec<Project>>;
    /// `Ok(None)` when the platform answers 404.
    fn get_project(&self, name: &str) -> Result<Option<Project>>;
    fn create_project(&self, spec: &ProjectSpec) -> Result<()>;
    fn update_project(&self, spec: &ProjectSpec) -> Result<()>;
    fn delete_project(&self, name: &str) -> Result<()>;

    // Deployments
    fn create_deployment(&self, project: &str) -> Result<Deployment>;
    fn get_deployment(&self, project: &str, revision: Revision) -> Result<Deployment>;
    fn get_logs(&self, project: &str) -> Result<Vec<String>>;

    // Resources
    fn set_secret(&self, project: &str, secret_name: &str, value: &str) -> Result<()>;
    fn list_bucket_keys(&self, project: &str, bucket: &str) -> Result<Vec<String>>;
    fn get_bucket_object(&self, project: &str, bucket: &str, key: &str) -> Result<Vec<u8>>;
    fn get_database_connection_info(
        &self,
        project: &str,
        database: &str,
    ) -> Result<DatabaseConnectionInfo>;

    // Account and schema
    fn get_project_schema(&self) -> Result<Value>;
    fn get_current_user(&self) -> Result<User>;

    // AI service
    fn generate(&self, archive: Vec<u8>, project_name: &str) -> Result<GenerateResponse>;
    fn generate_spec(&self, archive: Vec<u8>, project_name: &str) -> Result<AiSpec>;
    fn lint(&self, archive: Vec<u8>) -> Result<AiLintReport>;
    fn agents_md(&self) -> Result<String>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

pub struct Client {
    http: reqwest::blocking::Client,
    api_base_url: String,
    ai_base_url: String,
    auth_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectList {
    Bare(Vec<Project>),
    Wrapped { projects: Vec<Project> },
}

#[derive(Deserialize)]
struct LogsResponse {
    #[serde(default)]
    logs: Vec<String>,
}

#[derive(Deserialize)]
struct BucketKeysResponse {
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LintResponse {
    Wrapped { ai_lint_report: AiLintReport },
    Bare(AiLintReport),
}

impl Client {
    pub fn new(config: &EffectiveConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(API_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base_url: config.api_base_url.clone(),
            ai_base_url: config.ai_base_url.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.api_base_url, segments)
    }

    fn ai_url(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.ai_base_url, segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "request");
        let rb = self
            .http
            .request(method, url)
            .header(CLI_VERSION_HEADER, CLI_VERSION);
        match &self.auth_token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    fn send(&self, rb: RequestBuilder) -> Result<Response> {
        check(rb.send()?)
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let resp = self.send(self.request(Method::GET, self.api_url(segments)?))?;
        Ok(resp.json()?)
    }

    fn archive_form(archive: Vec<u8>) -> Result<Form> {
        let part = Part::bytes(archive)
            .file_name(ARCHIVE_FILENAME)
            .mime_str("application/zip")?;
        Ok(Form::new().part(ARCHIVE_FIELD, part))
    }

    fn post_archive(&self, segments: &[&str], form: Form) -> Result<Response> {
        self.send(
            self.request(Method::POST, self.ai_url(segments)?)
                .timeout(AI_TIMEOUT)
                .multipart(form),
        )
    }
}

/// Append `segments` to the base URL's path. Each segment is percent-encoded,
/// so names containing `/`, `?` or spaces stay a single path segment.
fn join_segments(base: &str, segments: &[&str]) -> Result<Url> {
    let invalid = |reason: String| NeptuneError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("URL cannot have a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map any non-2xx response to [`NeptuneError::Api`].
fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %body, "api error");
    Err(NeptuneError::Api {
        status: status.as_u16(),
        body,
    })
}

impl PlatformApi for Client {
    fn list_projects(&self) -> Result<Vec<Project>> {
        let resp = self
            .request(Method::GET, self.api_url(&["projects"])?)
            .send()?;
        // Not every platform deployment exposes the list endpoint.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        Ok(match check(resp)?.json::<ProjectList>()? {
            ProjectList::Bare(projects) | ProjectList::Wrapped { projects } => projects,
        })
    }

    fn get_project(&self, name: &str) -> Result<Option<Project>> {
        let resp = self
            .request(Method::GET, self.api_url(&["project", name])?)
            .send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(resp)?.json()?))
    }

    fn create_project(&self, spec: &ProjectSpec) -> Result<()> {
        let url = self.api_url(&["project"])?;
        self.send(self.request(Method::POST, url).json(spec))?;
        Ok(())
    }

    fn update_project(&self, spec: &ProjectSpec) -> Result<()> {
        let url = self.api_url(&["project", spec.name.as_str()])?;
        self.send(self.request(Method::PUT, url).json(spec))?;
        Ok(())
    }

    fn delete_project(&self, name: &str) -> Result<()> {
        let url = self.api_url(&["project", name])?;
        self.send(self.request(Method::DELETE, url))?;
        Ok(())
    }

    fn create_deployment(&self, project: &str) -> Result<Deployment> {
        let url = self.api_url(&["project", project, "deploy"])?;
        Ok(self.send(self.request(Method::POST, url))?.json()?)
    }

    fn get_deployment(&self, project: &str, revision: Revision) -> Result<Deployment> {
        let revision = revision.to_string();
        self.get_json(&["project", project, "deploy", revision.as_str()])
    }

    fn get_logs(&self, project: &str) -> Result<Vec<String>> {
        let resp: LogsResponse = self.get_json(&["project", project, "logs"])?;
        Ok(resp.logs)
    }

    fn set_secret(&self, project: &str, secret_name: &str, value: &str) -> Result<()> {
        let url = self.api_url(&["project", project, "secret"])?;
        let body = serde_json::json!({
            "secret_name": secret_name,
            "secret_string": value,
        });
        self.send(self.request(Method::PUT, url).json(&body))?;
        Ok(())
    }

    fn list_bucket_keys(&self, project: &str, bucket: &str) -> Result<Vec<String>> {
        let resp: BucketKeysResponse = self.get_json(&["project", project, "bucket", bucket])?;
        Ok(resp.keys)
    }

    fn get_bucket_object(&self, project: &str, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let url = self.api_url(&["project", project, "bucket", bucket, "object", key])?;
        let resp = self.send(self.request(Method::GET, url))?;
        Ok(resp.bytes()?.to_vec())
    }

    fn get_database_connection_info(
        &self,
        project: &str,
        database: &str,
    ) -> Result<DatabaseConnectionInfo> {
        self.get_json(&["project", project, "database", database, "connection-info"])
    }

    fn get_project_schema(&self) -> Result<Value> {
        self.get_json(&["schema", "project"])
    }

    fn get_current_user(&self) -> Result<User> {
        self.get_json(&["users", "me"])
    }

    fn generate(&self, archive: Vec<u8>, project_name: &str) -> Result<GenerateResponse> {
        let form = Self::archive_form(archive)?.text("project_name", project_name.to_string());
        Ok(self.post_archive(&["v1", "generate"], form)?.json()?)
    }

    fn generate_spec(&self, archive: Vec<u8>, project_name: &str) -> Result<AiSpec> {
        let form = Self::archive_form(archive)?.text("project_name", project_name.to_string());
        Ok(self.post_archive(&["v1", "generate", "spec"], form)?.json()?)
    }

    fn lint(&self, archive: Vec<u8>) -> Result<AiLintReport> {
        let form = Self::archive_form(archive)?;
        Ok(match self.post_archive(&["v1", "lint"], form)?.json::<LintResponse>()? {
            LintResponse::Wrapped { ai_lint_report } => ai_lint_report,
            LintResponse::Bare(report) => report,
        })
    }

    fn agents_md(&self) -> Result<String> {
        let resp = self.send(self.request(Method::GET, self.ai_url(&["v1", "agents.md"])?))?;
        Ok(resp.text()?)
    }
}
