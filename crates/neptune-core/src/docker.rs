use crate::error::{NeptuneError, Result};
use crate::paths::DOCKERFILE;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Deployed workloads run on x86_64 regardless of the developer's machine.
pub const TARGET_PLATFORM: &str = "linux/amd64";
/// Username the managed registry expects alongside a push token.
pub const REGISTRY_USER: &str = "AWS";

/// Lines of build output kept for error reporting.
const BUILD_OUTPUT_TAIL: usize = 40;

// ---------------------------------------------------------------------------
// Process boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl DockerOutput {
    fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// Runs `docker <args>`. The exit status is the only success signal.
pub trait DockerCli {
    fn run(&self, args: &[&str], cwd: Option<&Path>, stdin: Option<&[u8]>)
        -> std::io::Result<DockerOutput>;
}

/// The `docker` executable on `PATH`.
pub struct SystemDocker {
    binary: PathBuf,
}

impl SystemDocker {
    pub fn new() -> Self {
        let binary = which::which("docker").unwrap_or_else(|_| PathBuf::from("docker"));
        Self { binary }
    }
}

impl Default for SystemDocker {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli for SystemDocker {
    fn run(
        &self,
        args: &[&str],
        cwd: Option<&Path>,
        stdin: Option<&[u8]>,
    ) -> std::io::Result<DockerOutput> {
        tracing::debug!(subcommand = args.first().copied().unwrap_or(""), "docker");
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = match stdin {
            Some(input) => {
                cmd.stdin(Stdio::piped());
                let mut child = cmd.spawn()?;
                if let Some(mut pipe) = child.stdin.take() {
                    pipe.write_all(input)?;
                }
                child.wait_with_output()?
            }
            None => cmd.stdin(Stdio::null()).output()?,
        };

        Ok(DockerOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Availability checks
// ---------------------------------------------------------------------------

/// `docker --version` exits zero.
pub fn docker_available(docker: &dyn DockerCli) -> bool {
    docker
        .run(&["--version"], None, None)
        .map(|o| o.success)
        .unwrap_or(false)
}

/// `docker info` exits zero, i.e. the daemon answers.
pub fn docker_running(docker: &dyn DockerCli) -> bool {
    docker
        .run(&["info"], None, None)
        .map(|o| o.success)
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Login, build, push
// ---------------------------------------------------------------------------

/// Registry host of an image reference (`host/repo:tag` -> `host`).
pub fn registry_host(image: &str) -> &str {
    image.split('/').next().unwrap_or(image)
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

/// Log in to the image's registry, piping the token on stdin.
pub fn login(docker: &dyn DockerCli, image: &str, push_token: &str) -> Result<()> {
    let registry = registry_host(image);
    let out = docker
        .run(
            &["login", "--username", REGISTRY_USER, "--password-stdin", registry],
            None,
            Some(push_token.as_bytes()),
        )
        .map_err(|e| NeptuneError::DockerLogin(e.to_string()))?;
    if !out.success {
        return Err(NeptuneError::DockerLogin(out.stderr.trim().to_string()));
    }
    Ok(())
}

pub fn build(docker: &dyn DockerCli, project_dir: &Path, image: &str) -> Result<()> {
    let out = docker
        .run(
            &[
                "build",
                "--platform",
                TARGET_PLATFORM,
                "-t",
                image,
                "-f",
                DOCKERFILE,
                ".",
            ],
            Some(project_dir),
            None,
        )
        .map_err(|e| NeptuneError::DockerBuild {
            output: e.to_string(),
        })?;
    if !out.success {
        return Err(NeptuneError::DockerBuild {
            output: tail(&out.combined(), BUILD_OUTPUT_TAIL),
        });
    }
    Ok(())
}

pub fn push(docker: &dyn DockerCli, image: &str) -> Result<()> {
    let out = docker
        .run(&["push", image], None, None)
        .map_err(|e| NeptuneError::DockerPush(e.to_string()))?;
    if !out.success {
        return Err(NeptuneError::DockerPush(out.stderr.trim().to_string()));
    }
    Ok(())
}

/// Login (when a token is given), build, push. A failed step stops the
/// pipeline and later steps never run.
pub fn build_and_push(
    docker: &dyn DockerCli,
    project_dir: &Path,
    image: &str,
    push_token: Option<&str>,
    on_status: &mut dyn FnMut(&str),
) -> Result<()> {
    if let Some(token) = push_token {
        on_status("Logging in to registry...");
        login(docker, image, token)?;
    }

    on_status(&format!("Building image {image} ({TARGET_PLATFORM})..."));
    build(docker, project_dir, image)?;

    on_status("Pushing image...");
    push(docker, image)?;
    tracing::info!(%image, "image pushed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubDocker;
    use tempfile::TempDir;

    #[test]
    fn registry_host_is_first_segment() {
        assert_eq!(
            registry_host("123.dkr.ecr.eu-west-2.amazonaws.com/demo:4"),
            "123.dkr.ecr.eu-west-2.amazonaws.com"
        );
        assert_eq!(registry_host("plain"), "plain");
    }

    #[test]
    fn pipeline_runs_login_build_push_in_order() {
        let dir = TempDir::new().unwrap();
        let docker = StubDocker::default();
        let mut statuses = Vec::new();
        build_and_push(
            &docker,
            dir.path(),
            "reg.example/demo:1",
            Some("tok"),
            &mut |s: &str| statuses.push(s.to_string()),
        )
        .unwrap();

        assert_eq!(docker.subcommands(), vec!["login", "build", "push"]);
        assert_eq!(statuses.len(), 3);
        // token goes through stdin, never argv
        let login = &docker.calls()[0];
        assert!(!login.args.iter().any(|a| a.contains("tok")));
        assert_eq!(login.stdin.as_deref(), Some(&b"tok"[..]));
        assert!(login.args.contains(&"reg.example".to_string()));
        assert!(login.args.contains(&"AWS".to_string()));
    }

    #[test]
    fn build_is_pinned_to_amd64_and_runs_in_project_dir() {
        let dir = TempDir::new().unwrap();
        let docker = StubDocker::default();
        build_and_push(&docker, dir.path(), "img:1", None, &mut |_| {}).unwrap();

        assert_eq!(docker.subcommands(), vec!["build", "push"]);
        let build = &docker.calls()[0];
        assert_eq!(
            build.args,
            vec!["build", "--platform", "linux/amd64", "-t", "img:1", "-f", "Dockerfile", "."]
        );
        assert_eq!(build.cwd.as_deref(), Some(dir.path()));
    }

    #[test]
    fn build_failure_never_pushes() {
        let dir = TempDir::new().unwrap();
        let docker = StubDocker::failing("build");
        let err = build_and_push(&docker, dir.path(), "img:1", Some("t"), &mut |_| {}).unwrap_err();
        match err {
            NeptuneError::DockerBuild { output } => assert!(output.contains("build failed")),
            other => panic!("expected build failure, got {other:?}"),
        }
        assert_eq!(docker.count("push"), 0);
    }

    #[test]
    fn login_failure_stops_before_build() {
        let dir = TempDir::new().unwrap();
        let docker = StubDocker::failing("login");
        let err = build_and_push(&docker, dir.path(), "img:1", Some("t"), &mut |_| {}).unwrap_err();
        assert!(matches!(err, NeptuneError::DockerLogin(_)));
        assert_eq!(docker.count("build"), 0);
        assert_eq!(docker.count("push"), 0);
    }

    #[test]
    fn push_failure_is_classified_as_push() {
        let dir = TempDir::new().unwrap();
        let docker = StubDocker::failing("push");
        let err = build_and_push(&docker, dir.path(), "img:1", None, &mut |_| {}).unwrap_err();
        assert!(matches!(err, NeptuneError::DockerPush(_)));
    }

    #[test]
    fn availability_checks_report_booleans() {
        let docker = StubDocker::not_installed();
        assert!(!docker_available(&docker));
        assert!(!docker_running(&docker));

        let docker = StubDocker::daemon_stopped();
        assert!(docker_available(&docker));
        assert!(!docker_running(&docker));
    }

    #[test]
    fn tail_keeps_last_lines() {
        let text = (1..=50).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let t = tail(&text, 3);
        assert_eq!(t, "48\n49\n50");
    }
}
