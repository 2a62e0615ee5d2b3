use crate::docker::{self, DockerCli};
use crate::dockerfile::{self, DockerfileGuidance};
use crate::error::NeptuneError;
use crate::paths;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub dockerfile_exists: bool,
    /// Present exactly when there is no Dockerfile.
    pub dockerfile_guidance: Option<DockerfileGuidance>,
    pub docker_available: bool,
    pub docker_running: bool,
}

impl PreflightReport {
    /// First missing prerequisite, in the order they are reported to users.
    pub fn first_failure(&self) -> Option<NeptuneError> {
        if !self.dockerfile_exists {
            Some(NeptuneError::DockerfileNotFound)
        } else if !self.docker_available {
            Some(NeptuneError::DockerNotInstalled)
        } else if !self.docker_running {
            Some(NeptuneError::DockerNotRunning)
        } else {
            None
        }
    }
}

/// Check local deploy prerequisites. Never fails; absence is reported as `false`.
pub fn check(docker: &dyn DockerCli, project_dir: &Path) -> PreflightReport {
    let dockerfile_exists = paths::dockerfile_path(project_dir).is_file();
    let dockerfile_guidance = (!dockerfile_exists).then(|| dockerfile::guidance(project_dir));
    let docker_available = docker::docker_available(docker);
    let docker_running = docker_available && docker::docker_running(docker);
    PreflightReport {
        dockerfile_exists,
        dockerfile_guidance,
        docker_available,
        docker_running,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubDocker;
    use tempfile::TempDir;

    #[test]
    fn guidance_only_without_dockerfile() {
        let dir = TempDir::new().unwrap();
        let docker = StubDocker::default();

        let report = check(&docker, dir.path());
        assert!(!report.dockerfile_exists);
        assert!(report.dockerfile_guidance.is_some());
        assert!(matches!(
            report.first_failure(),
            Some(NeptuneError::DockerfileNotFound)
        ));

        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();
        let report = check(&docker, dir.path());
        assert!(report.dockerfile_exists);
        assert!(report.dockerfile_guidance.is_none());
        assert!(report.first_failure().is_none());
    }

    #[test]
    fn missing_docker_skips_daemon_check() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();
        let docker = StubDocker::not_installed();
        let report = check(&docker, dir.path());
        assert!(!report.docker_available);
        assert!(!report.docker_running);
        assert_eq!(docker.count("info"), 0);
        assert!(matches!(
            report.first_failure(),
            Some(NeptuneError::DockerNotInstalled)
        ));
    }

    #[test]
    fn stopped_daemon_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();
        let report = check(&StubDocker::daemon_stopped(), dir.path());
        assert!(report.docker_available);
        assert!(matches!(
            report.first_failure(),
            Some(NeptuneError::DockerNotRunning)
        ));
    }
}
