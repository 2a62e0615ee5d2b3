use crate::client::PlatformApi;
use crate::error::{NeptuneError, Result};
use crate::models::{Project, ProjectSpec, ProvisioningState, ResourceState, ResourceStatus};
use crate::poll::{poll, PollOutcome, PollPolicy, Step};
use crate::spec::require_spec;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionResult {
    /// The project did not exist before this call.
    pub created: bool,
    pub project: Project,
    /// Final resource list, including provider-assigned ids.
    pub resources: Vec<ResourceStatus>,
}

/// Push `neptune.json` in `project_dir` to the platform and wait for it to settle.
pub fn provision(
    api: &dyn PlatformApi,
    project_dir: &Path,
    policy: &PollPolicy,
) -> Result<ProvisionResult> {
    let spec = require_spec(project_dir)?;
    provision_spec(api, &spec, policy)
}

/// Create-or-update the project, then poll until the project is `Ready`
/// and no resource is `Pending`.
///
/// An `Error` provisioning state is not terminal: the platform retries, so
/// polling continues until `Ready`.
pub fn provision_spec(
    api: &dyn PlatformApi,
    spec: &ProjectSpec,
    policy: &PollPolicy,
) -> Result<ProvisionResult> {
    spec.validate()?;
    let name = spec.name.as_str();

    let created = match api.get_project(name)? {
        None => {
            tracing::info!(project = name, "creating project");
            api.create_project(spec)
                .map_err(|e| NeptuneError::ProvisioningFailed(e.to_string()))?;
            true
        }
        Some(_) => {
            // A full replace: resources missing from the spec are released.
            tracing::info!(project = name, "updating project");
            api.update_project(spec)
                .map_err(|e| NeptuneError::ProvisioningFailed(e.to_string()))?;
            false
        }
    };

    let fetch = || {
        api.get_project(name)?
            .ok_or_else(|| NeptuneError::ProjectNotFound(name.to_string()))
    };

    let ready = poll(policy, || {
        let project = fetch()?;
        match &project.provisioning_state {
            ProvisioningState::Ready => Ok(Step::Done(project)),
            ProvisioningState::Error => {
                tracing::warn!(project = name, "project reported Error, still waiting for Ready");
                Ok(Step::Pending(project))
            }
            _ => Ok(Step::Pending(project)),
        }
    })?;
    settled(ready, name)?;

    let project = poll(policy, || {
        let project = fetch()?;
        if project
            .resources
            .iter()
            .any(|r| r.status == ResourceState::Pending)
        {
            Ok(Step::Pending(project))
        } else {
            Ok(Step::Done(project))
        }
    })?;
    let project = settled(project, name)?;

    tracing::info!(project = name, resources = project.resources.len(), "provisioned");
    Ok(ProvisionResult {
        created,
        resources: project.resources.clone(),
        project,
    })
}

fn settled(outcome: PollOutcome<Project>, name: &str) -> Result<Project> {
    match outcome {
        PollOutcome::Done(p) => Ok(p),
        PollOutcome::Exhausted(_) | PollOutcome::TimedOut(_) => Err(
            NeptuneError::ProvisioningFailed(format!("project '{name}' is still provisioning")),
        ),
    }
}
