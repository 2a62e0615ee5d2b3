//! Deployment orchestration.
//!
//! `Preflight → SpecReady → LintClear → Provisioned → DeploymentCreated →
//! ImagePushed → Polling → Done`, strictly in order. The first failure ends the
//! run and is translated into messages plus a suggested next command; nothing
//! is retried.

use crate::client::PlatformApi;
use crate::docker::{self, DockerCli};
use crate::dockerfile::DockerfileGuidance;
use crate::error::NeptuneError;
use crate::lint::{self, LintAssessment};
use crate::models::{
    AiLintReport, Deployment, DeploymentStatus, ProjectSpec, ProvisioningState, Revision,
    RunningStatus,
};
use crate::poll::{poll, PollOutcome, PollPolicy, Step};
use crate::{preflight, provision, spec};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStage {
    Preflight,
    SpecReady,
    LintClear,
    Provisioned,
    DeploymentCreated,
    ImagePushed,
    Polling,
    Done,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeployStage::Preflight => "Preflight",
            DeployStage::SpecReady => "Configuration",
            DeployStage::LintClear => "AI Lint",
            DeployStage::Provisioned => "Infrastructure",
            DeployStage::DeploymentCreated => "Deployment",
            DeployStage::ImagePushed => "Build",
            DeployStage::Polling => "Deploy",
            DeployStage::Done => "Status",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Reuse the existing `neptune.json` instead of generating one.
    pub skip_spec: bool,
    /// Skip AI lint entirely.
    pub skip_lint: bool,
    pub allow_ai_errors: bool,
    pub allow_ai_warnings: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    /// A stage is about to run.
    Stage(DeployStage),
    Status(String),
    /// A step finished successfully.
    Completed(String),
    Warning(String),
}

/// Receives progress from [`Deployer::run`]. Every method has a no-op default.
pub trait DeployObserver {
    fn event(&mut self, _event: DeployEvent) {}

    fn lint_report(&mut self, _report: &AiLintReport, _assessment: &LintAssessment) {}

    /// Asked once, after lint and before anything is provisioned.
    fn confirm_proceed(&mut self, _spec: &ProjectSpec) -> bool {
        true
    }
}

/// Observer for non-interactive callers.
pub struct Unattended;

impl DeployObserver for Unattended {}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentSummary {
    pub revision: u64,
    pub status: DeploymentStatus,
}

impl From<&Deployment> for DeploymentSummary {
    fn from(d: &Deployment) -> Self {
        DeploymentSummary {
            revision: d.revision,
            status: d.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalCondition {
    pub provisioning_state: ProvisioningState,
    pub running_status: RunningStatus,
}

#[derive(Debug, Serialize)]
pub struct DeployOutcome {
    pub ok: bool,
    pub messages: Vec<String>,
    pub next_action_command: String,
    pub project: String,
    /// Last stage entered; on failure, the stage that failed.
    pub stage: DeployStage,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub aborted_by_user: bool,
    pub deployment: Option<DeploymentSummary>,
    /// `false` when the status budget ran out before `Deployed` was observed.
    pub deployment_confirmed: bool,
    pub final_condition: Option<FinalCondition>,
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_lint_report: Option<AiLintReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lint: Option<LintAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile_guidance: Option<DockerfileGuidance>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spec_warnings: Vec<String>,
    #[serde(skip)]
    pub error: Option<NeptuneError>,
}

impl DeployOutcome {
    fn new(project: String) -> Self {
        DeployOutcome {
            ok: false,
            messages: Vec::new(),
            next_action_command: String::new(),
            project,
            stage: DeployStage::Preflight,
            aborted_by_user: false,
            deployment: None,
            deployment_confirmed: false,
            final_condition: None,
            final_url: None,
            ai_lint_report: None,
            lint: None,
            dockerfile_guidance: None,
            spec_warnings: Vec::new(),
            error: None,
        }
    }

    /// Record `err` as the terminal failure of the current stage.
    fn fail(mut self, err: NeptuneError) -> Self {
        let (messages, next) = failure_guidance(&err, self.dockerfile_guidance.as_ref());
        tracing::debug!(stage = ?self.stage, error = %err, "deploy failed");
        self.ok = false;
        self.messages = messages;
        self.next_action_command = next.to_string();
        self.error = Some(err);
        self
    }
}

/// User-facing messages and next command for a terminal deploy failure.
pub fn failure_guidance(
    err: &NeptuneError,
    guidance: Option<&DockerfileGuidance>,
) -> (Vec<String>, &'static str) {
    match err {
        NeptuneError::DockerfileNotFound => {
            let mut messages = vec!["Dockerfile not found in project directory".to_string()];
            if let Some(g) = guidance {
                messages.push(format!("Detected project type: {}", g.project_type));
            }
            messages.push("To deploy, you need to create a Dockerfile.".to_string());
            (messages, "Create a Dockerfile, then run: neptune deploy")
        }
        NeptuneError::DockerNotInstalled => (
            vec![
                "Docker is not installed or not found in PATH".to_string(),
                "Install Docker: https://docs.docker.com/get-docker/".to_string(),
            ],
            "Install Docker, then run: neptune deploy",
        ),
        NeptuneError::DockerNotRunning => (
            vec![
                "Docker daemon is not running".to_string(),
                "Start Docker and try again".to_string(),
            ],
            "Start Docker, then run: neptune deploy",
        ),
        NeptuneError::SpecNotFound(_) => (
            vec![
                "Cannot skip spec generation because neptune.json does not exist".to_string(),
                "Run `neptune generate spec` first".to_string(),
            ],
            "neptune generate spec",
        ),
        NeptuneError::DockerLogin(detail) => (
            vec!["Docker login to registry failed".to_string(), detail.clone()],
            "neptune deploy",
        ),
        NeptuneError::DockerBuild { output } => {
            let mut messages = vec![
                "Docker build failed".to_string(),
                "Check your Dockerfile for errors".to_string(),
            ];
            if !output.trim().is_empty() {
                messages.push(output.clone());
            }
            (messages, "Fix Dockerfile, then run: neptune deploy")
        }
        NeptuneError::DockerPush(detail) => (
            vec!["Docker push failed".to_string(), detail.clone()],
            "neptune deploy",
        ),
        other => (vec![other.to_string()], "neptune deploy"),
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Deployer<'a> {
    api: &'a dyn PlatformApi,
    docker: &'a dyn DockerCli,
    provisioning: PollPolicy,
    deployment: PollPolicy,
}

impl<'a> Deployer<'a> {
    pub fn new(api: &'a dyn PlatformApi, docker: &'a dyn DockerCli) -> Self {
        Deployer {
            api,
            docker,
            provisioning: PollPolicy::PROVISIONING,
            deployment: PollPolicy::DEPLOYMENT,
        }
    }

    pub fn with_policies(mut self, provisioning: PollPolicy, deployment: PollPolicy) -> Self {
        self.provisioning = provisioning;
        self.deployment = deployment;
        self
    }

    /// Run the full pipeline for the project in `project_dir`.
    ///
    /// Never returns an error: failures are reported in the outcome.
    pub fn run(
        &self,
        project_dir: &Path,
        opts: &DeployOptions,
        observer: &mut dyn DeployObserver,
    ) -> DeployOutcome {
        let mut out = DeployOutcome::new(spec::resolve_project_name(project_dir));

        // Preflight
        observer.event(DeployEvent::Stage(DeployStage::Preflight));
        let report = preflight::check(self.docker, project_dir);
        out.dockerfile_guidance = report.dockerfile_guidance.clone();
        if let Some(err) = report.first_failure() {
            return out.fail(err);
        }
        observer.event(DeployEvent::Completed("Dockerfile found".into()));
        observer.event(DeployEvent::Completed(
            "Docker is installed and running".into(),
        ));

        // Spec
        out.stage = DeployStage::SpecReady;
        observer.event(DeployEvent::Stage(DeployStage::SpecReady));
        let resolution = match spec::resolve_spec(
            self.api,
            project_dir,
            &out.project,
            opts.skip_spec,
            !opts.skip_lint,
        ) {
            Ok(r) => r,
            Err(e) => return out.fail(e),
        };
        for w in &resolution.warnings {
            observer.event(DeployEvent::Warning(w.clone()));
        }
        out.spec_warnings = resolution.warnings.clone();
        out.project = resolution.spec.name.clone();
        observer.event(DeployEvent::Completed(if resolution.generated {
            "Generated neptune.json".into()
        } else {
            "Using existing neptune.json".into()
        }));

        // Lint
        out.stage = DeployStage::LintClear;
        let lint_report = if opts.skip_lint {
            observer.event(DeployEvent::Status("Skipping AI lint (--skip-lint)".into()));
            None
        } else if resolution.generated {
            resolution.lint_report.clone()
        } else {
            observer.event(DeployEvent::Status("Running AI lint...".into()));
            match lint::run_ai_lint(self.api, project_dir) {
                Ok(r) => Some(r),
                Err(e) => return out.fail(e),
            }
        };
        if let Some(report) = lint_report {
            observer.event(DeployEvent::Stage(DeployStage::LintClear));
            let assessment = lint::assess(&report, opts.allow_ai_errors, opts.allow_ai_warnings);
            observer.lint_report(&report, &assessment);
            let blocking = assessment.blocking;
            out.ai_lint_report = Some(report);
            out.lint = Some(assessment);
            if blocking {
                let mut messages = out
                    .lint
                    .as_ref()
                    .map(|a| a.reasons.clone())
                    .unwrap_or_default();
                messages.push("Deployment aborted due to AI lint findings.".into());
                out.messages = messages;
                out.next_action_command = "Fix issues, then run: neptune deploy".into();
                return out;
            }
        }

        if !observer.confirm_proceed(&resolution.spec) {
            out.aborted_by_user = true;
            out.messages = vec!["Aborted by user.".into()];
            out.next_action_command = "neptune deploy".into();
            return out;
        }

        // Provision
        out.stage = DeployStage::Provisioned;
        observer.event(DeployEvent::Stage(DeployStage::Provisioned));
        observer.event(DeployEvent::Status("Provisioning infrastructure...".into()));
        if let Err(e) = provision::provision(self.api, project_dir, &self.provisioning) {
            return out.fail(e);
        }
        observer.event(DeployEvent::Completed("Infrastructure ready".into()));

        // Create deployment
        out.stage = DeployStage::DeploymentCreated;
        let deployment = match self.api.create_deployment(&out.project) {
            Ok(d) => d,
            Err(e) => return out.fail(NeptuneError::DeploymentCreation(e.to_string())),
        };
        out.deployment = Some(DeploymentSummary::from(&deployment));

        // Build and push
        out.stage = DeployStage::ImagePushed;
        observer.event(DeployEvent::Stage(DeployStage::ImagePushed));
        observer.event(DeployEvent::Status(format!(
            "Building image for revision {}...",
            deployment.revision
        )));
        let pushed = docker::build_and_push(
            self.docker,
            project_dir,
            &deployment.image,
            deployment.push_token.as_deref(),
            &mut |line: &str| observer.event(DeployEvent::Status(line.to_string())),
        );
        if let Err(e) = pushed {
            return out.fail(e);
        }
        observer.event(DeployEvent::Completed(
            "Image built and pushed successfully".into(),
        ));

        // Poll deployment status
        out.stage = DeployStage::Polling;
        observer.event(DeployEvent::Stage(DeployStage::Polling));
        observer.event(DeployEvent::Status(format!(
            "Deployment created (revision {})",
            deployment.revision
        )));
        observer.event(DeployEvent::Status(
            "Waiting for deployment to complete...".into(),
        ));
        let revision = Revision::Number(deployment.revision);
        let polled = poll(&self.deployment, || {
            let d = self.api.get_deployment(&out.project, revision)?;
            Ok(if d.status == DeploymentStatus::Deployed {
                Step::Done(d)
            } else {
                Step::Pending(d)
            })
        });
        let latest = match polled {
            Ok(PollOutcome::Done(d)) => {
                out.deployment_confirmed = true;
                d
            }
            Ok(outcome) => {
                let d = outcome.into_inner();
                tracing::warn!(
                    project = %out.project,
                    revision = d.revision,
                    status = %d.status,
                    "deployment status budget exhausted"
                );
                observer.event(DeployEvent::Warning(format!(
                    "Revision {} is still {}; check again with `neptune status`",
                    d.revision, d.status
                )));
                d
            }
            Err(e) => {
                let mut out = out.fail(e);
                out.next_action_command = "neptune status".into();
                return out;
            }
        };
        out.deployment = Some(DeploymentSummary::from(&latest));

        // Final condition
        out.stage = DeployStage::Done;
        match self.api.get_project(&out.project) {
            Ok(Some(project)) => {
                out.final_url = project.url();
                out.final_condition = Some(FinalCondition {
                    provisioning_state: project.provisioning_state,
                    running_status: project.running_status,
                });
            }
            Ok(None) => {}
            Err(e) => {
                let mut out = out.fail(e);
                out.next_action_command = "neptune status".into();
                return out;
            }
        }

        out.ok = true;
        out.messages = vec![if out.deployment_confirmed {
            format!("Deployed revision {}", latest.revision)
        } else {
            format!(
                "Revision {} pushed; deployment status is {}",
                latest.revision, latest.status
            )
        }];
        out.next_action_command = "neptune status".into();
        tracing::info!(project = %out.project, revision = latest.revision, "deploy finished");
        out
    }
}
