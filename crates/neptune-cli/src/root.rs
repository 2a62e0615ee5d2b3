use std::path::{Path, PathBuf};

/// Resolve the project directory.
///
/// Priority:
/// 1. `--working-directory` / `--wd` (passed in as `explicit`), relative to cwd
/// 2. The current directory
pub fn resolve_project_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let dir = match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd,
    };
    if !dir.is_dir() {
        anyhow::bail!("working directory does not exist: {}", dir.display());
    }
    Ok(dir.canonicalize().unwrap_or(dir))
}
