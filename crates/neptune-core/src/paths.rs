use crate::error::{NeptuneError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Project files
// ---------------------------------------------------------------------------

pub const SPEC_FILE: &str = "neptune.json";
pub const DOCKERFILE: &str = "Dockerfile";
pub const AGENTS_MD: &str = "AGENTS.md";

pub const METADATA_DIR: &str = ".neptune";
pub const PROJECT_NAME_FILE: &str = ".neptune/project_name";
pub const START_COMMAND_FILE: &str = ".neptune/start_command";

/// Lint configuration files that are always shipped with the project archive.
pub const LINT_CONFIG_FILES: &[&str] = &[".neptune-lint.toml", "neptune-lint.toml"];

// ---------------------------------------------------------------------------
// User config
// ---------------------------------------------------------------------------

pub const USER_CONFIG_DIR: &str = "neptune";
pub const USER_CONFIG_FILE: &str = "config.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn spec_path(dir: &Path) -> PathBuf {
    dir.join(SPEC_FILE)
}

pub fn dockerfile_path(dir: &Path) -> PathBuf {
    dir.join(DOCKERFILE)
}

pub fn agents_md_path(dir: &Path) -> PathBuf {
    dir.join(AGENTS_MD)
}

pub fn project_name_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_NAME_FILE)
}

pub fn start_command_path(dir: &Path) -> PathBuf {
    dir.join(START_COMMAND_FILE)
}

/// `<config dir>/neptune/config.json` for the current user.
pub fn user_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(NeptuneError::ConfigDirNotFound)?;
    Ok(base.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE))
}
