use crate::client::PlatformApi;
use crate::error::{NeptuneError, Result};
use crate::io::{atomic_write, read_optional};
use crate::paths;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static BLOCK_RE: OnceLock<Regex> = OnceLock::new();

fn block_re() -> &'static Regex {
    BLOCK_RE.get_or_init(|| {
        Regex::new(r"(?s)<!-- neptune: agents\.md version ([^>]+?) -->.*?<!-- neptune end -->")
            .unwrap()
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AgentsMdChange {
    Created,
    Appended,
    Updated { from: String, to: String },
    UpToDate { version: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentsMdResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub change: AgentsMdChange,
}

impl AgentsMdResult {
    pub fn changed(&self) -> bool {
        !matches!(self.change, AgentsMdChange::UpToDate { .. })
    }
}

/// Version declared by the managed block in `content`.
pub fn block_version(content: &str) -> Option<String> {
    block_re()
        .captures(content)
        .map(|c| c[1].trim().to_string())
}

/// Merge the remote block into `existing`. `None` means nothing to write.
///
/// Versions compare as plain strings. A file holding several managed blocks
/// is collapsed to one: the first block is replaced by the newest of the
/// remote and local blocks and the others are removed.
pub fn merge(existing: Option<&str>, remote: &str) -> Result<(AgentsMdChange, Option<String>)> {
    let remote_version = block_version(remote).ok_or_else(|| NeptuneError::MalformedResponse {
        endpoint: "agents.md".to_string(),
        reason: "no version marker in fetched content".to_string(),
    })?;

    let Some(existing) = existing else {
        return Ok((AgentsMdChange::Created, Some(remote.to_string())));
    };

    let blocks: Vec<_> = block_re().captures_iter(existing).collect();
    let Some(newest) = blocks.iter().max_by(|a, b| a[1].trim().cmp(b[1].trim())) else {
        return Ok((
            AgentsMdChange::Appended,
            Some(format!("{existing}\n\n{remote}")),
        ));
    };
    let local = newest[1].trim().to_string();
    if blocks.len() == 1 && local >= remote_version {
        return Ok((AgentsMdChange::UpToDate { version: local }, None));
    }

    let (keep, kept_version) = if local >= remote_version {
        (&newest[0], local.clone())
    } else {
        (remote, remote_version)
    };
    let mut merged = String::with_capacity(existing.len() + keep.len());
    let mut cursor = 0;
    for (i, caps) in blocks.iter().enumerate() {
        let m = caps.get(0).map_or(0..0, |m| m.range());
        let gap = &existing[cursor..m.start];
        cursor = m.end;
        if i == 0 {
            merged.push_str(gap);
            merged.push_str(keep);
        } else {
            // Blank lines in front of a removed block go with it.
            merged.push_str(gap.trim_end());
        }
    }
    merged.push_str(&existing[cursor..]);

    Ok((
        AgentsMdChange::Updated {
            from: local,
            to: kept_version,
        },
        Some(merged),
    ))
}

/// Fetch the managed block and bring `AGENTS.md` in `project_dir` up to date.
pub fn update_agents_md(api: &dyn PlatformApi, project_dir: &Path) -> Result<AgentsMdResult> {
    let remote = api.agents_md()?;
    let path = paths::agents_md_path(project_dir);
    let existing = read_optional(&path)?;

    let (change, content) = merge(existing.as_deref(), &remote)?;
    if let Some(content) = content {
        atomic_write(&path, content.as_bytes())?;
        tracing::info!(path = %path.display(), ?change, "AGENTS.md written");
    }
    Ok(AgentsMdResult { path, change })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubApi;
    use tempfile::TempDir;

    fn block(version: &str, body: &str) -> String {
        format!("<!-- neptune: agents.md version {version} -->\n{body}\n<!-- neptune end -->")
    }

    #[test]
    fn version_is_extracted() {
        assert_eq!(block_version(&block("1.2", "x")).as_deref(), Some("1.2"));
        assert_eq!(block_version("# nothing here"), None);
    }

    #[test]
    fn creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let api = StubApi::default();
        api.set_agents_md(&block("1", "deploy with neptune"));

        let res = update_agents_md(&api, dir.path()).unwrap();
        assert_eq!(res.change, AgentsMdChange::Created);
        let written = std::fs::read_to_string(dir.path().join("AGENTS.md")).unwrap();
        assert!(written.contains("deploy with neptune"));
    }

    #[test]
    fn appends_to_file_without_block() {
        let (change, content) = merge(Some("# My agents"), &block("1", "neptune")).unwrap();
        assert_eq!(change, AgentsMdChange::Appended);
        let content = content.unwrap();
        assert!(content.starts_with("# My agents\n\n<!-- neptune"));
    }

    #[test]
    fn replaces_only_the_block_when_newer() {
        let existing = format!("# Intro\n\n{}\n\n# Outro", block("1", "old"));
        let (change, content) = merge(Some(&existing), &block("2", "new $1 text")).unwrap();
        assert_eq!(
            change,
            AgentsMdChange::Updated {
                from: "1".into(),
                to: "2".into()
            }
        );
        let content = content.unwrap();
        assert!(content.starts_with("# Intro"));
        assert!(content.ends_with("# Outro"));
        assert!(content.contains("new $1 text"));
        assert!(!content.contains("old"));
    }

    #[test]
    fn duplicate_blocks_collapse_into_one() {
        let existing = format!(
            "# Intro\n\n{}\n\n# Middle\n\n{}\n\n# Outro",
            block("1", "first copy"),
            block("1", "second copy")
        );
        let (change, content) = merge(Some(&existing), &block("2", "fresh")).unwrap();
        assert_eq!(
            change,
            AgentsMdChange::Updated {
                from: "1".into(),
                to: "2".into()
            }
        );
        let content = content.unwrap();
        assert_eq!(
            content,
            format!("# Intro\n\n{}\n\n# Middle\n\n# Outro", block("2", "fresh"))
        );
        assert_eq!(block_re().find_iter(&content).count(), 1);
    }

    #[test]
    fn duplicate_blocks_are_collapsed_even_when_current() {
        let existing = format!("{}\n\n{}", block("1", "stale"), block("3", "newest"));
        let (change, content) = merge(Some(&existing), &block("2", "remote")).unwrap();
        assert_eq!(
            change,
            AgentsMdChange::Updated {
                from: "3".into(),
                to: "3".into()
            }
        );
        assert_eq!(content.unwrap(), block("3", "newest"));
    }

    #[test]
    fn same_or_older_remote_leaves_file_alone() {
        let existing = block("2", "local");
        let (change, content) = merge(Some(&existing), &block("2", "remote")).unwrap();
        assert_eq!(change, AgentsMdChange::UpToDate { version: "2".into() });
        assert!(content.is_none());

        let (_, content) = merge(Some(&existing), &block("1", "remote")).unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn remote_without_marker_is_rejected() {
        assert!(merge(None, "no marker").is_err());
    }
}
