use crate::paths;
use crate::spec::read_start_command;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    Python,
    Node,
    Go,
    Rust,
    Ruby,
    Java,
    Unknown,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProjectType::Python => "Python",
            ProjectType::Node => "Node.js",
            ProjectType::Go => "Go",
            ProjectType::Rust => "Rust",
            ProjectType::Ruby => "Ruby",
            ProjectType::Java => "Java",
            ProjectType::Unknown => "Unknown",
        })
    }
}

/// Manifest files checked in order; the first type with any hit wins.
const MARKERS: &[(ProjectType, &[&str])] = &[
    (
        ProjectType::Python,
        &["pyproject.toml", "requirements.txt", "Pipfile", "setup.py", "uv.lock"],
    ),
    (ProjectType::Node, &["package.json"]),
    (ProjectType::Go, &["go.mod"]),
    (ProjectType::Rust, &["Cargo.toml"]),
    (ProjectType::Ruby, &["Gemfile"]),
    (
        ProjectType::Java,
        &["pom.xml", "build.gradle", "build.gradle.kts"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DockerfileGuidance {
    pub dockerfile_exists: bool,
    pub project_type: String,
    pub detected_files: Vec<String>,
    pub start_command: Option<String>,
    pub dockerfile_example: String,
    pub requirements: Vec<String>,
    pub best_practices: Vec<String>,
}

/// Detect the project's language from manifest files in `dir`.
pub fn detect_project_type(dir: &Path) -> (ProjectType, Vec<String>) {
    for (ty, files) in MARKERS {
        let found: Vec<String> = files
            .iter()
            .filter(|f| dir.join(f).is_file())
            .map(|f| f.to_string())
            .collect();
        if !found.is_empty() {
            return (*ty, found);
        }
    }
    (ProjectType::Unknown, Vec::new())
}

/// Persisted start command first, then simple per-language heuristics.
pub fn detect_start_command(dir: &Path, ty: ProjectType) -> Option<String> {
    if let Ok(Some(cmd)) = read_start_command(dir) {
        return Some(cmd);
    }
    match ty {
        ProjectType::Python => ["main.py", "app.py", "server.py"]
            .iter()
            .find(|f| dir.join(f).is_file())
            .map(|f| format!("python {f}")),
        ProjectType::Node => {
            let raw = std::fs::read_to_string(dir.join("package.json")).ok()?;
            let pkg: serde_json::Value = serde_json::from_str(&raw).ok()?;
            if pkg["scripts"]["start"].is_string() {
                Some("npm start".to_string())
            } else {
                pkg["main"].as_str().map(|m| format!("node {m}"))
            }
        }
        ProjectType::Go | ProjectType::Rust => Some("./app".to_string()),
        ProjectType::Ruby if dir.join("config.ru").is_file() => {
            Some("bundle exec rackup --host 0.0.0.0 --port 8080".to_string())
        }
        ProjectType::Java => Some("java -jar app.jar".to_string()),
        _ => None,
    }
}

fn example_for(ty: ProjectType, start: Option<&str>) -> String {
    match ty {
        ProjectType::Python => format!(
            "FROM python:3.12-slim\n\
             WORKDIR /app\n\
             COPY requirements.txt .\n\
             RUN pip install --no-cache-dir -r requirements.txt\n\
             COPY . .\n\
             EXPOSE 8080\n\
             CMD {}",
            exec_form(start.unwrap_or("python main.py"))
        ),
        ProjectType::Node => format!(
            "FROM node:20-slim\n\
             WORKDIR /app\n\
             COPY package*.json ./\n\
             RUN npm ci --omit=dev\n\
             COPY . .\n\
             EXPOSE 8080\n\
             CMD {}",
            exec_form(start.unwrap_or("npm start"))
        ),
        ProjectType::Go => "FROM golang:1.22 AS build\n\
             WORKDIR /src\n\
             COPY . .\n\
             RUN CGO_ENABLED=0 go build -o /app .\n\
             \n\
             FROM gcr.io/distroless/static\n\
             COPY --from=build /app /app\n\
             EXPOSE 8080\n\
             CMD [\"/app\"]"
            .to_string(),
        ProjectType::Rust => "FROM rust:1-slim AS build\n\
             WORKDIR /src\n\
             COPY . .\n\
             # replace `app` with the name of your binary target\n\
             RUN cargo build --release --bin app\n\
             \n\
             FROM debian:bookworm-slim\n\
             COPY --from=build /src/target/release/app /app\n\
             EXPOSE 8080\n\
             CMD [\"/app\"]"
            .to_string(),
        ProjectType::Ruby => format!(
            "FROM ruby:3.3-slim\n\
             WORKDIR /app\n\
             COPY Gemfile Gemfile.lock ./\n\
             RUN bundle install\n\
             COPY . .\n\
             EXPOSE 8080\n\
             CMD {}",
            exec_form(start.unwrap_or("bundle exec ruby app.rb"))
        ),
        ProjectType::Java => "FROM eclipse-temurin:21-jdk AS build\n\
             WORKDIR /src\n\
             COPY . .\n\
             RUN ./mvnw -q package -DskipTests && cp target/*.jar /app.jar\n\
             \n\
             FROM eclipse-temurin:21-jre\n\
             COPY --from=build /app.jar /app.jar\n\
             EXPOSE 8080\n\
             CMD [\"java\", \"-jar\", \"/app.jar\"]"
            .to_string(),
        ProjectType::Unknown => format!(
            "FROM debian:bookworm-slim\n\
             WORKDIR /app\n\
             COPY . .\n\
             EXPOSE 8080\n\
             CMD {}",
            exec_form(start.unwrap_or("./start.sh"))
        ),
    }
}

/// `python app.py` -> `["python", "app.py"]`
fn exec_form(cmd: &str) -> String {
    let parts: Vec<String> = cmd
        .split_whitespace()
        .map(|p| format!("\"{}\"", p.replace('"', "\\\"")))
        .collect();
    format!("[{}]", parts.join(", "))
}

fn requirements() -> Vec<String> {
    [
        "The Dockerfile must be named `Dockerfile` and live in the project root",
        "The image must build for linux/amd64",
        "The service must listen on 0.0.0.0 and the port given by the PORT environment variable \
         (default 8080)",
        "The container must run in the foreground and not exit after startup",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn best_practices(ty: ProjectType) -> Vec<String> {
    let mut out: Vec<String> = [
        "Use a slim or distroless base image",
        "Copy dependency manifests before source code to cache dependency layers",
        "Add a .dockerignore to keep build context small",
        "Read secrets and connection strings from environment variables, \
         never bake them into the image",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    match ty {
        ProjectType::Go | ProjectType::Rust | ProjectType::Java => {
            out.push("Use a multi-stage build so compilers stay out of the runtime image".into())
        }
        ProjectType::Python => out.push("Pin dependency versions in requirements.txt".into()),
        ProjectType::Node => out.push("Commit package-lock.json and install with npm ci".into()),
        _ => {}
    }
    out
}

/// Inspect `dir` and produce a Dockerfile template and checklist.
pub fn guidance(dir: &Path) -> DockerfileGuidance {
    let dockerfile_exists = paths::dockerfile_path(dir).is_file();
    let (ty, detected_files) = detect_project_type(dir);
    let start_command = detect_start_command(dir, ty);
    DockerfileGuidance {
        dockerfile_exists,
        project_type: ty.to_string(),
        detected_files,
        dockerfile_example: example_for(ty, start_command.as_deref()),
        start_command,
        requirements: requirements(),
        best_practices: best_practices(ty),
    }
}
