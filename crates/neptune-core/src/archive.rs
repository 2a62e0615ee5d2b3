use crate::error::{NeptuneError, Result};
use crate::paths::LINT_CONFIG_FILES;
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Cap on the summed size of archived files (uncompressed).
pub const MAX_ARCHIVE_SIZE: u64 = 200 * 1024 * 1024;

/// Directory and file names skipped when walking a non-git directory.
const WALK_DENYLIST: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    ".env",
    "target",
    "dist",
    "build",
    ".DS_Store",
];

/// Suffixes skipped when walking a non-git directory.
const WALK_DENY_SUFFIXES: &[&str] = &[".pyc"];

/// Zip the project at `root` for upload to the AI service.
pub fn build_archive(root: &Path) -> Result<Vec<u8>> {
    build_archive_with_limit(root, MAX_ARCHIVE_SIZE)
}

/// Same as [`build_archive`] with an explicit size cap. Exceeding the cap
/// aborts; no partial archive is returned.
pub fn build_archive_with_limit(root: &Path, limit: u64) -> Result<Vec<u8>> {
    let mut files = collect_files(root)?;
    for name in LINT_CONFIG_FILES {
        if root.join(name).is_file() {
            files.insert(PathBuf::from(name));
        }
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut total: u64 = 0;

    for rel in &files {
        let abs = root.join(rel);
        let meta = match std::fs::metadata(&abs) {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        total += meta.len();
        if total > limit {
            return Err(NeptuneError::ArchiveTooLarge { limit, size: total });
        }
        writer.start_file(archive_name(rel), options)?;
        writer.write_all(&std::fs::read(&abs)?)?;
    }

    let bytes = writer.finish()?.into_inner();
    tracing::debug!(files = files.len(), bytes = bytes.len(), "built project archive");
    Ok(bytes)
}

/// Relative file paths to include, sorted for a stable archive layout.
fn collect_files(root: &Path) -> Result<BTreeSet<PathBuf>> {
    match git_files(root) {
        Some(files) => Ok(files),
        None => walk_files(root),
    }
}

/// Tracked plus untracked-but-not-ignored files, or `None` when `root` is not
/// inside a git checkout (or git is unavailable).
fn git_files(root: &Path) -> Option<BTreeSet<PathBuf>> {
    // -z keeps non-ASCII names raw instead of C-quoting them.
    let output = Command::new("git")
        .args(["ls-files", "-z", "--cached", "--others", "--exclude-standard"])
        .current_dir(root)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(
        output
            .stdout
            .split(|b| *b == 0)
            .filter(|entry| !entry.is_empty())
            .map(path_from_bytes)
            .filter(|p| root.join(p).is_file())
            .collect(),
    )
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

fn walk_files(root: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_denied(&e.file_name().to_string_lossy()));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.insert(rel.to_path_buf());
        }
    }
    Ok(files)
}

fn is_denied(name: &str) -> bool {
    WALK_DENYLIST.contains(&name) || WALK_DENY_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Zip entry names always use forward slashes.
fn archive_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
