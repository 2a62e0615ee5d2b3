use crate::error::{NeptuneError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

fn git_binary() -> Result<PathBuf> {
    which::which("git").map_err(|_| NeptuneError::GitNotInstalled)
}

fn run_git(git: &Path, args: &[&str], cwd: Option<&Path>) -> Result<()> {
    let mut cmd = Command::new(git);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(NeptuneError::Git {
            command: args.first().copied().unwrap_or_default().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Shallow-clone `url` and copy its contents (or `subfolder` of it) into
/// `target`. The template's own history is never kept; with `init_git` a
/// fresh repository is initialised in `target`.
///
/// Existing files in `target` are overwritten.
pub fn clone_template(
    url: &str,
    target: &Path,
    subfolder: Option<&str>,
    init_git: bool,
) -> Result<()> {
    let git = git_binary()?;
    let tmp = tempfile::TempDir::new()?;
    let checkout = tmp.path().join("template");
    let checkout_str = checkout.to_string_lossy().into_owned();

    tracing::info!(url, target = %target.display(), "cloning template");
    run_git(&git, &["clone", "--depth", "1", url, &checkout_str], None)?;

    let source = match subfolder {
        Some(sub) => {
            let src = checkout.join(sub);
            if !src.is_dir() {
                return Err(NeptuneError::TemplateSubfolderNotFound(sub.to_string()));
            }
            src
        }
        None => checkout,
    };

    std::fs::create_dir_all(target)?;
    let copied = copy_tree(&source, target)?;
    tracing::debug!(files = copied, "template copied");

    if init_git && !target.join(".git").exists() {
        run_git(&git, &["init", "--quiet"], Some(target))?;
    }
    Ok(())
}

/// Copy every file under `src` into `dest`, skipping `.git`. Returns the
/// number of files copied.
fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let mut count = 0;
    let walker = WalkDir::new(src)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");
    for entry in walker {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let out = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&out)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &out)?;
            count += 1;
        }
    }
    Ok(count)
}

/// True when `dir` exists and has at least one entry.
pub fn is_non_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
