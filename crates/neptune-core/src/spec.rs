use crate::archive;
use crate::client::PlatformApi;
use crate::error::{NeptuneError, Result};
use crate::io::{atomic_write, read_optional, read_single_value, write_single_value};
use crate::models::{AiLintReport, AiSpec, ProjectSpec, ResourceDeclaration, ResourceKind};
use crate::paths;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// neptune.json
// ---------------------------------------------------------------------------

/// Read and validate `neptune.json`. `Ok(None)` when the file does not exist.
pub fn read_spec(dir: &Path) -> Result<Option<ProjectSpec>> {
    let Some(raw) = read_optional(&paths::spec_path(dir))? else {
        return Ok(None);
    };
    let spec: ProjectSpec =
        serde_json::from_str(&raw).map_err(|e| NeptuneError::InvalidSpec(e.to_string()))?;
    spec.validate()?;
    Ok(Some(spec))
}

/// Like [`read_spec`] but a missing file is an error.
pub fn require_spec(dir: &Path) -> Result<ProjectSpec> {
    read_spec(dir)?.ok_or_else(|| NeptuneError::SpecNotFound(paths::spec_path(dir)))
}

/// Write `neptune.json` with 2-space indentation.
pub fn write_spec(dir: &Path, spec: &ProjectSpec) -> Result<PathBuf> {
    let path = paths::spec_path(dir);
    let mut data = serde_json::to_string_pretty(spec)?;
    data.push('\n');
    atomic_write(&path, data.as_bytes())?;
    Ok(path)
}

/// Key-sorted compact form used for change detection.
fn canonical<T: Serialize>(value: &T) -> Result<String> {
    // serde_json's default map is ordered, so this sorts keys.
    let v: Value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&v)?)
}

fn canonical_on_disk(dir: &Path) -> Option<String> {
    let raw = read_optional(&paths::spec_path(dir)).ok()??;
    let v: Value = serde_json::from_str(&raw).ok()?;
    serde_json::to_string(&v).ok()
}

// ---------------------------------------------------------------------------
// Project metadata
// ---------------------------------------------------------------------------

/// Project name recorded locally: `neptune.json` first, then `.neptune/project_name`.
pub fn read_project_name(dir: &Path) -> Result<Option<String>> {
    if let Some(raw) = read_optional(&paths::spec_path(dir))? {
        if let Ok(v) = serde_json::from_str::<Value>(&raw) {
            let name = v
                .get("name")
                .or_else(|| v.get("spec").and_then(|s| s.get("name")))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty());
            if let Some(name) = name {
                return Ok(Some(name.to_string()));
            }
        }
    }
    read_single_value(&paths::project_name_path(dir))
}

/// Name to use for the project in `dir`, falling back to the directory name.
pub fn resolve_project_name(dir: &Path) -> String {
    if let Ok(Some(name)) = read_project_name(dir) {
        return name;
    }
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}

pub fn write_project_metadata(dir: &Path, project_name: &str) -> Result<()> {
    write_single_value(&paths::project_name_path(dir), project_name)
}

pub fn read_start_command(dir: &Path) -> Result<Option<String>> {
    read_single_value(&paths::start_command_path(dir))
}

pub fn write_start_command(dir: &Path, start_command: &str) -> Result<()> {
    write_single_value(&paths::start_command_path(dir), start_command)
}

// ---------------------------------------------------------------------------
// AI spec -> platform spec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSpec {
    pub spec: ProjectSpec,
    /// One line per AI resource that has no platform counterpart.
    pub warnings: Vec<String>,
}

/// Total mapping from the AI service's spec shape to `neptune.json`.
///
/// `kind` is always `Service`; the name is `project_name` when given, else the
/// AI-proposed name. Resource kinds outside the platform vocabulary are kept
/// as-is and reported in `warnings`.
pub fn ai_spec_to_platform(ai: &AiSpec, project_name: Option<&str>) -> MappedSpec {
    let mut spec = ProjectSpec::new(
        project_name
            .map(str::to_string)
            .or_else(|| ai.name.clone())
            .unwrap_or_default(),
    );
    let mut warnings = Vec::new();

    for res in &ai.resources {
        let kind = ResourceKind::from_ai_kind(&res.kind);
        if spec.has_resource(&kind, &res.name) {
            warnings.push(format!("duplicate {kind} resource '{}' ignored", res.name));
            continue;
        }
        if !kind.is_known() {
            tracing::warn!(kind = %res.kind, name = %res.name, "unrecognised resource kind");
            warnings.push(format!(
                "resource '{}' has unrecognised kind '{}'; passing it to the platform unchanged",
                res.name, res.kind
            ));
        }
        spec.resources.push(ResourceDeclaration {
            kind,
            name: res.name.clone(),
        });
    }

    MappedSpec { spec, warnings }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SpecResolution {
    pub spec: ProjectSpec,
    pub spec_path: PathBuf,
    /// The on-disk file was (re)written.
    pub changed: bool,
    /// The spec came from the AI service rather than the existing file.
    pub generated: bool,
    pub lint_report: Option<AiLintReport>,
    pub start_command: Option<String>,
    pub warnings: Vec<String>,
}

/// Reuse the on-disk spec or generate a fresh one.
///
/// With `skip_generation` the file must exist and the AI service is never
/// contacted. Otherwise the project is archived and sent for generation;
/// `with_lint` selects the endpoint that also returns an AI lint report.
pub fn resolve_spec(
    api: &dyn PlatformApi,
    project_dir: &Path,
    project_name: &str,
    skip_generation: bool,
    with_lint: bool,
) -> Result<SpecResolution> {
    let spec_path = paths::spec_path(project_dir);

    if skip_generation {
        let spec = require_spec(project_dir)?;
        return Ok(SpecResolution {
            spec,
            spec_path,
            changed: false,
            generated: false,
            lint_report: None,
            start_command: None,
            warnings: Vec::new(),
        });
    }

    let archive = archive::build_archive(project_dir)?;
    let (ai_spec, lint_report, start_command) = if with_lint {
        let resp = api
            .generate(archive, project_name)
            .map_err(|e| NeptuneError::SpecGeneration(e.to_string()))?;
        (resp.platform_spec, resp.ai_lint_report, resp.start_command)
    } else {
        let spec = api
            .generate_spec(archive, project_name)
            .map_err(|e| NeptuneError::SpecGeneration(e.to_string()))?;
        (spec, None, None)
    };

    let MappedSpec { spec, warnings } = ai_spec_to_platform(&ai_spec, Some(project_name));
    spec.validate()?;

    let changed = canonical_on_disk(project_dir).as_deref() != Some(canonical(&spec)?.as_str());
    if changed {
        write_spec(project_dir, &spec)?;
        tracing::info!(path = %spec_path.display(), "wrote project spec");
    }

    let start_command = start_command.filter(|s| !s.trim().is_empty());
    if let Some(cmd) = &start_command {
        write_start_command(project_dir, cmd)?;
    }

    Ok(SpecResolution {
        spec,
        spec_path,
        changed,
        generated: true,
        lint_report,
        start_command,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiResource, GenerateResponse};
    use crate::testing::StubApi;
    use tempfile::TempDir;

    fn ai_spec() -> AiSpec {
        AiSpec {
            kind: Some("Backend".into()),
            name: Some("ai-name".into()),
            resources: vec![
                AiResource {
                    kind: "Database".into(),
                    name: "db".into(),
                },
                AiResource {
                    kind: "ObjectStorageBucket".into(),
                    name: "uploads".into(),
                },
                AiResource {
                    kind: "Queue".into(),
                    name: "jobs".into(),
                },
            ],
        }
    }

    #[test]
    fn mapping_renames_bucket_and_keeps_unknown_kinds() {
        let mapped = ai_spec_to_platform(&ai_spec(), Some("demo"));
        assert_eq!(mapped.spec.kind, "Service");
        assert_eq!(mapped.spec.name, "demo");
        assert_eq!(
            mapped.spec.resources,
            vec![
                ResourceDeclaration {
                    kind: ResourceKind::Database,
                    name: "db".into()
                },
                ResourceDeclaration {
                    kind: ResourceKind::StorageBucket,
                    name: "uploads".into()
                },
                ResourceDeclaration {
                    kind: ResourceKind::Other("Queue".into()),
                    name: "jobs".into()
                },
            ]
        );
        assert_eq!(mapped.warnings.len(), 1);
        assert!(mapped.warnings[0].contains("Queue"));
        assert!(mapped.warnings[0].contains("jobs"));
    }

    #[test]
    fn unknown_kind_is_written_to_neptune_json_verbatim() {
        let dir = TempDir::new().unwrap();
        let spec = ai_spec_to_platform(&ai_spec(), Some("demo")).spec;
        write_spec(dir.path(), &spec).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("neptune.json")).unwrap())
                .unwrap();
        assert_eq!(
            raw["resources"][2],
            serde_json::json!({"kind": "Queue", "name": "jobs"})
        );
    }

    #[test]
    fn duplicate_ai_resources_are_collapsed() {
        let mut ai = ai_spec();
        ai.resources.push(AiResource {
            kind: "StorageBucket".into(),
            name: "uploads".into(),
        });
        let mapped = ai_spec_to_platform(&ai, Some("demo"));
        assert_eq!(mapped.spec.resources.len(), 3);
        assert!(mapped.warnings.iter().any(|w| w.contains("duplicate")));
    }

    #[test]
    fn mapping_uses_ai_name_without_override() {
        let mapped = ai_spec_to_platform(&ai_spec(), None);
        assert_eq!(mapped.spec.name, "ai-name");
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let spec = ai_spec_to_platform(&ai_spec(), Some("demo")).spec;
        write_spec(dir.path(), &spec).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("neptune.json")).unwrap();
        assert!(raw.contains("\n  \"kind\": \"Service\""));
        assert_eq!(read_spec(dir.path()).unwrap().unwrap(), spec);
    }

    #[test]
    fn read_accepts_any_key_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("neptune.json"),
            r#"{"resources":[{"name":"s","kind":"Secret"}],"name":"demo","kind":"Service"}"#,
        )
        .unwrap();
        let spec = read_spec(dir.path()).unwrap().unwrap();
        assert_eq!(spec.name, "demo");
        assert_eq!(spec.resources[0].kind, ResourceKind::Secret);
    }

    #[test]
    fn skip_generation_without_file_is_spec_not_found() {
        let dir = TempDir::new().unwrap();
        let api = StubApi::default();
        let err = resolve_spec(&api, dir.path(), "demo", true, true).unwrap_err();
        assert!(matches!(err, NeptuneError::SpecNotFound(_)));
        assert_eq!(api.calls("generate"), 0);
    }

    #[test]
    fn skip_generation_returns_existing_file_untouched() {
        let dir = TempDir::new().unwrap();
        let raw = "{\"kind\":\"Service\",\"name\":\"demo\",\"resources\":[]}";
        std::fs::write(dir.path().join("neptune.json"), raw).unwrap();
        let api = StubApi::default();

        let res = resolve_spec(&api, dir.path(), "demo", true, true).unwrap();
        assert_eq!(res.spec.name, "demo");
        assert!(!res.changed);
        assert!(!res.generated);
        assert_eq!(api.calls("generate"), 0);
        assert_eq!(api.calls("generate_spec"), 0);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("neptune.json")).unwrap(),
            raw
        );
    }

    #[test]
    fn second_generation_with_same_response_is_unchanged() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.py"), "print(1)").unwrap();
        let api = StubApi::default();
        api.set_generate(GenerateResponse {
            platform_spec: ai_spec(),
            ai_lint_report: Some(AiLintReport::default()),
            start_command: Some("python app.py".into()),
        });

        let first = resolve_spec(&api, dir.path(), "demo", false, true).unwrap();
        assert!(first.changed);
        assert!(first.generated);
        assert!(first.lint_report.is_some());
        assert_eq!(
            read_start_command(dir.path()).unwrap().as_deref(),
            Some("python app.py")
        );

        let second = resolve_spec(&api, dir.path(), "demo", false, true).unwrap();
        assert!(!second.changed);
        assert_eq!(api.calls("generate"), 2);
    }

    #[test]
    fn without_lint_uses_spec_only_endpoint() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.go"), "package main").unwrap();
        let api = StubApi::default();
        api.set_generate(GenerateResponse {
            platform_spec: ai_spec(),
            ai_lint_report: None,
            start_command: None,
        });
        let res = resolve_spec(&api, dir.path(), "demo", false, false).unwrap();
        assert!(res.lint_report.is_none());
        assert_eq!(api.calls("generate_spec"), 1);
        assert_eq!(api.calls("generate"), 0);
    }

    #[test]
    fn generation_failure_is_wrapped() {
        let dir = TempDir::new().unwrap();
        let api = StubApi::default();
        let err = resolve_spec(&api, dir.path(), "demo", false, true).unwrap_err();
        assert!(matches!(err, NeptuneError::SpecGeneration(_)));
        assert!(err.to_string().starts_with("Failed to generate spec"));
    }

    #[test]
    fn project_name_priority() {
        let dir = TempDir::new().unwrap();
        write_project_metadata(dir.path(), "from-metadata").unwrap();
        assert_eq!(resolve_project_name(dir.path()), "from-metadata");

        std::fs::write(
            dir.path().join("neptune.json"),
            r#"{"spec":{"name":"nested"}}"#,
        )
        .unwrap();
        assert_eq!(resolve_project_name(dir.path()), "nested");

        std::fs::write(dir.path().join("neptune.json"), r#"{"name":"top"}"#).unwrap();
        assert_eq!(resolve_project_name(dir.path()), "top");
    }

    #[test]
    fn project_name_falls_back_to_directory() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("my-app");
        std::fs::create_dir(&sub).unwrap();
        assert_eq!(resolve_project_name(&sub), "my-app");
    }
}
