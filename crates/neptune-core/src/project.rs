use crate::client::PlatformApi;
use crate::error::{NeptuneError, Result};
use crate::models::{Project, ProvisioningState, ResourceStatus, RunState, RunningStatus};
use crate::poll::{poll, PollOutcome, PollPolicy, Step};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStatus {
    pub name: String,
    pub kind: String,
    pub provisioning_state: ProvisioningState,
    pub running_status: RunningStatus,
    pub resources: Vec<ResourceStatus>,
    pub url: Option<String>,
}

impl From<Project> for ProjectStatus {
    fn from(p: Project) -> Self {
        let url = p.url();
        ProjectStatus {
            name: p.name,
            kind: p.kind,
            provisioning_state: p.provisioning_state,
            running_status: p.running_status,
            resources: p.resources,
            url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub kind: String,
    pub provisioning_state: ProvisioningState,
    pub running_status: RunState,
    pub resource_count: usize,
    pub url: Option<String>,
}

impl From<&Project> for ProjectSummary {
    fn from(p: &Project) -> Self {
        ProjectSummary {
            name: p.name.clone(),
            kind: p.kind.clone(),
            provisioning_state: p.provisioning_state.clone(),
            running_status: p.running_status.current.clone(),
            resource_count: p.resources.len(),
            url: p.url(),
        }
    }
}

fn require_project(api: &dyn PlatformApi, name: &str) -> Result<Project> {
    api.get_project(name)?
        .ok_or_else(|| NeptuneError::ProjectNotFound(name.to_string()))
}

pub fn get_project_status(api: &dyn PlatformApi, name: &str) -> Result<ProjectStatus> {
    Ok(require_project(api, name)?.into())
}

pub fn list_projects(api: &dyn PlatformApi) -> Result<Vec<ProjectSummary>> {
    Ok(api.list_projects()?.iter().map(ProjectSummary::from).collect())
}

pub fn delete_project(api: &dyn PlatformApi, name: &str) -> Result<()> {
    require_project(api, name)?;
    api.delete_project(name)?;
    tracing::info!(project = name, "project deleted");
    Ok(())
}

pub fn get_logs(api: &dyn PlatformApi, name: &str) -> Result<Vec<String>> {
    api.get_logs(name)
}

/// Poll until the service is `Running`.
///
/// `Stopped` and `Error` fail with [`NeptuneError::DeploymentFailed`]; passing
/// the policy's timeout fails with [`NeptuneError::Timeout`].
pub fn wait_for_deployment(
    api: &dyn PlatformApi,
    name: &str,
    policy: &PollPolicy,
) -> Result<ProjectStatus> {
    let outcome = poll(policy, || {
        let project = require_project(api, name)?;
        match &project.running_status.current {
            RunState::Running => Ok(Step::Done(project)),
            state @ (RunState::Stopped | RunState::Error) => Err(NeptuneError::DeploymentFailed {
                project: name.to_string(),
                state: state.to_string(),
            }),
            _ => Ok(Step::Pending(project)),
        }
    })?;

    match outcome {
        PollOutcome::Done(p) => Ok(p.into()),
        PollOutcome::Exhausted(p) | PollOutcome::TimedOut(p) => Err(NeptuneError::Timeout {
            project: name.to_string(),
            seconds: policy.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            state: p.running_status.current.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{project_running, StubApi};
    use std::time::Duration;

    #[test]
    fn status_includes_url() {
        let api = StubApi::default();
        api.script_projects(vec![Some(project_running("demo", "Running", Some("1.2.3.4")))]);
        let status = get_project_status(&api, "demo").unwrap();
        assert_eq!(status.url.as_deref(), Some("http://1.2.3.4"));
    }

    #[test]
    fn status_of_missing_project() {
        let api = StubApi::default();
        assert!(matches!(
            get_project_status(&api, "ghost"),
            Err(NeptuneError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn delete_checks_existence_first() {
        let api = StubApi::default();
        assert!(delete_project(&api, "ghost").is_err());
        assert_eq!(api.calls("delete_project"), 0);

        api.script_projects(vec![Some(project_running("demo", "Running", None))]);
        delete_project(&api, "demo").unwrap();
        assert_eq!(api.calls("delete_project"), 1);
    }

    #[test]
    fn wait_returns_when_running() {
        let api = StubApi::default();
        api.script_projects(vec![
            Some(project_running("demo", "Unknown", None)),
            Some(project_running("demo", "Running", Some("5.6.7.8"))),
        ]);
        let policy = PollPolicy::wait(Duration::from_secs(60)).with_interval(Duration::ZERO);
        let status = wait_for_deployment(&api, "demo", &policy).unwrap();
        assert_eq!(status.running_status.current, RunState::Running);
    }

    #[test]
    fn wait_fails_on_stopped() {
        let api = StubApi::default();
        api.script_projects(vec![Some(project_running("demo", "Stopped", None))]);
        let policy = PollPolicy::wait(Duration::from_secs(60)).with_interval(Duration::ZERO);
        match wait_for_deployment(&api, "demo", &policy).unwrap_err() {
            NeptuneError::DeploymentFailed { state, .. } => assert_eq!(state, "Stopped"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn wait_times_out() {
        let api = StubApi::default();
        api.script_projects(vec![Some(project_running("demo", "Unknown", None))]);
        let policy = PollPolicy::wait(Duration::ZERO).with_interval(Duration::ZERO);
        match wait_for_deployment(&api, "demo", &policy).unwrap_err() {
            NeptuneError::Timeout { state, .. } => assert_eq!(state, "Unknown"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
