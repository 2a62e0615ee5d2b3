use crate::error::Result;
use crate::io::atomic_write;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "https://neptune.shuttle.dev/v1";
pub const DEFAULT_AI_BASE_URL: &str = "https://neptune-ai.shuttle.dev";
pub const LOCAL_API_BASE_URL: &str = "http://localhost:8000/v1";
pub const LOCAL_AI_BASE_URL: &str = "http://localhost:8001";

pub const ENV_API_ENV: &str = "NEPTUNE_API_ENV";
pub const ENV_API_BASE_URL: &str = "NEPTUNE_API_BASE_URL";
pub const ENV_AI_BASE_URL: &str = "NEPTUNE_AI_BASE_URL";
pub const ENV_ACCESS_TOKEN: &str = "NEPTUNE_ACCESS_TOKEN";
pub const ENV_API_KEY: &str = "NEPTUNE_API_KEY";

// ---------------------------------------------------------------------------
// Effective configuration
// ---------------------------------------------------------------------------

/// Configuration for one invocation. Built once, then passed by reference to
/// every component that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub api_base_url: String,
    pub ai_base_url: String,
    pub auth_token: Option<String>,
}

/// Highest-priority layer, set in-process (e.g. right after an API-key login).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub ai_base_url: Option<String>,
    pub auth_token: Option<String>,
}

impl EffectiveConfig {
    /// Resolve from the process environment and the per-user config file.
    pub fn resolve(overrides: &ConfigOverrides) -> Self {
        let file = paths::user_config_path().ok();
        Self::resolve_with(overrides, |k| std::env::var(k).ok(), file.as_deref())
    }

    /// Merge, lowest to highest: built-in default, environment, persisted
    /// file, explicit overrides.
    pub fn resolve_with(
        overrides: &ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
        config_file: Option<&Path>,
    ) -> Self {
        let env = |k: &str| env(k).filter(|v| !v.trim().is_empty());

        let local = env(ENV_API_ENV).is_some_and(|v| v.eq_ignore_ascii_case("local"));
        let mut cfg = if local {
            EffectiveConfig {
                api_base_url: LOCAL_API_BASE_URL.to_string(),
                ai_base_url: LOCAL_AI_BASE_URL.to_string(),
                auth_token: None,
            }
        } else {
            EffectiveConfig {
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
                ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
                auth_token: None,
            }
        };

        if let Some(url) = env(ENV_API_BASE_URL) {
            cfg.api_base_url = url;
        }
        if let Some(url) = env(ENV_AI_BASE_URL) {
            cfg.ai_base_url = url;
        }
        if let Some(token) = env(ENV_API_KEY).or_else(|| env(ENV_ACCESS_TOKEN)) {
            cfg.auth_token = Some(token);
        }

        if let Some(path) = config_file {
            let file = PersistedConfig::load(path);
            if let Some(url) = file.api_base_url {
                cfg.api_base_url = url;
            }
            if let Some(url) = file.ai_base_url {
                cfg.ai_base_url = url;
            }
            if let Some(token) = file.api_key.or(file.access_token) {
                cfg.auth_token = Some(token);
            }
        }

        if let Some(url) = &overrides.api_base_url {
            cfg.api_base_url = url.clone();
        }
        if let Some(url) = &overrides.ai_base_url {
            cfg.ai_base_url = url.clone();
        }
        if let Some(token) = &overrides.auth_token {
            cfg.auth_token = Some(token.clone());
        }

        cfg.api_base_url = cfg.api_base_url.trim_end_matches('/').to_string();
        cfg.ai_base_url = cfg.ai_base_url.trim_end_matches('/').to_string();
        cfg
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }
}

// ---------------------------------------------------------------------------
// Persisted user config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_base_url: Option<String>,
}

impl PersistedConfig {
    /// A missing or malformed file reads as an empty config.
    pub fn load(path: &Path) -> Self {
        let Ok(data) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&data) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring malformed config file"
                );
                Self::default()
            }
        }
    }

    /// Overwrite the whole file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        atomic_write(path, data.as_bytes())
    }
}

/// Default location of the persisted config, if the platform has one.
pub fn default_config_path() -> Result<PathBuf> {
    paths::user_config_path()
}

/// Store an API key, replacing any previous credential.
pub fn store_api_key(path: &Path, api_key: &str) -> Result<()> {
    let mut cfg = PersistedConfig::load(path);
    cfg.api_key = Some(api_key.to_string());
    cfg.access_token = None;
    cfg.save_to_file(path)
}

/// Store an OAuth access token, replacing any previous credential.
pub fn store_access_token(path: &Path, token: &str) -> Result<()> {
    let mut cfg = PersistedConfig::load(path);
    cfg.access_token = Some(token.to_string());
    cfg.api_key = None;
    cfg.save_to_file(path)
}

/// Drop stored credentials, keeping URL overrides.
pub fn clear_auth(path: &Path) -> Result<()> {
    let mut cfg = PersistedConfig::load(path);
    cfg.access_token = None;
    cfg.api_key = None;
    cfg.save_to_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env_or_file() {
        let cfg = EffectiveConfig::resolve_with(&ConfigOverrides::default(), env_of(&[]), None);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.ai_base_url, DEFAULT_AI_BASE_URL);
        assert!(cfg.auth_token.is_none());
    }

    #[test]
    fn local_env_switches_defaults() {
        let cfg = EffectiveConfig::resolve_with(
            &ConfigOverrides::default(),
            env_of(&[(ENV_API_ENV, "local")]),
            None,
        );
        assert_eq!(cfg.api_base_url, LOCAL_API_BASE_URL);
        assert_eq!(cfg.ai_base_url, LOCAL_AI_BASE_URL);
    }

    #[test]
    fn precedence_env_then_file_then_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        PersistedConfig {
            access_token: Some("file-token".into()),
            api_base_url: Some("https://file.example/v1/".into()),
            ..Default::default()
        }
        .save_to_file(&path)
        .unwrap();

        let env = env_of(&[
            (ENV_API_BASE_URL, "https://env.example/v1"),
            (ENV_AI_BASE_URL, "https://ai-env.example"),
            (ENV_ACCESS_TOKEN, "env-token"),
        ]);
        let cfg = EffectiveConfig::resolve_with(&ConfigOverrides::default(), &env, Some(&path));
        assert_eq!(cfg.api_base_url, "https://file.example/v1");
        assert_eq!(cfg.ai_base_url, "https://ai-env.example");
        assert_eq!(cfg.auth_token.as_deref(), Some("file-token"));

        let overrides = ConfigOverrides {
            auth_token: Some("fresh-key".into()),
            ..Default::default()
        };
        let cfg = EffectiveConfig::resolve_with(&overrides, &env, Some(&path));
        assert_eq!(cfg.auth_token.as_deref(), Some("fresh-key"));
    }

    #[test]
    fn malformed_file_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let cfg = EffectiveConfig::resolve_with(
            &ConfigOverrides::default(),
            env_of(&[(ENV_ACCESS_TOKEN, "env-token")]),
            Some(&path),
        );
        assert_eq!(cfg.auth_token.as_deref(), Some("env-token"));
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn api_key_wins_over_access_token_in_same_layer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        PersistedConfig {
            access_token: Some("oauth".into()),
            api_key: Some("key".into()),
            ..Default::default()
        }
        .save_to_file(&path)
        .unwrap();
        let cfg =
            EffectiveConfig::resolve_with(&ConfigOverrides::default(), env_of(&[]), Some(&path));
        assert_eq!(cfg.auth_token.as_deref(), Some("key"));
    }

    #[test]
    fn clear_auth_keeps_url_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("neptune/config.json");
        store_api_key(&path, "k1").unwrap();
        let mut cfg = PersistedConfig::load(&path);
        cfg.api_base_url = Some("https://staging.example/v1".into());
        cfg.save_to_file(&path).unwrap();

        clear_auth(&path).unwrap();
        let cfg = PersistedConfig::load(&path);
        assert!(cfg.api_key.is_none());
        assert!(cfg.access_token.is_none());
        assert_eq!(cfg.api_base_url.as_deref(), Some("https://staging.example/v1"));
    }

    #[test]
    fn storing_token_replaces_api_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        store_api_key(&path, "k1").unwrap();
        store_access_token(&path, "t1").unwrap();
        let cfg = PersistedConfig::load(&path);
        assert_eq!(cfg.access_token.as_deref(), Some("t1"));
        assert!(cfg.api_key.is_none());
    }
}
