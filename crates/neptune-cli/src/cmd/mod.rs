pub mod auth;
pub mod deploy;
pub mod dockerfile;
pub mod generate;
pub mod init;
pub mod lint;
pub mod logs;
pub mod mcp;
pub mod project;
pub mod resource;
pub mod schema;
pub mod wait;

use crate::output::Ui;
use neptune_core::client::Client;
use neptune_core::config::{ConfigOverrides, EffectiveConfig};
use neptune_core::spec;
use std::path::PathBuf;

/// Per-invocation state shared by every command.
pub struct Ctx {
    /// Project directory.
    pub dir: PathBuf,
    pub ui: Ui,
    pub config: EffectiveConfig,
}

impl Ctx {
    pub fn new(dir: PathBuf, ui: Ui) -> Self {
        Ctx {
            dir,
            ui,
            config: EffectiveConfig::resolve(&ConfigOverrides::default()),
        }
    }

    pub fn client(&self) -> anyhow::Result<Client> {
        Ok(Client::new(&self.config)?)
    }

    /// Explicit `--project-name`, else the name resolved from the directory.
    pub fn project_name(&self, explicit: Option<String>) -> String {
        explicit.unwrap_or_else(|| spec::resolve_project_name(&self.dir))
    }
}
