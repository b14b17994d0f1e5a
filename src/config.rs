use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_SESSION_ID: &str = "default";

/// Endpoint override, checked before the config file.
const ENDPOINT_ENV_VAR: &str = "CHATTERM_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub session_id: Option<String>,
}

impl Config {
    /// Load the config file, falling back to defaults when it is missing or
    /// unreadable. A broken file is reported, not fatal: the app still runs,
    /// just without the overrides.
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from_or_default(&path),
            _ => Self::default(),
        }
    }

    fn load_from_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|err| {
            tracing::warn!(
                "failed to load config from {}: {err:#}; using defaults",
                path.display()
            );
            Self::default()
        })
    }

    fn load_from(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn endpoint(&self) -> String {
        resolve_endpoint(std::env::var(ENDPOINT_ENV_VAR).ok(), self.endpoint.clone())
    }

    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn session_id(&self) -> String {
        self.session_id
            .clone()
            .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chatterm").join("config.json"))
    }
}

fn resolve_endpoint(env_override: Option<String>, configured: Option<String>) -> String {
    env_override
        .or(configured)
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_config_is_empty() {
        let config = Config::default();
        assert_eq!(config.model(), "mistral");
        assert_eq!(config.session_id(), "default");
    }

    #[test]
    fn endpoint_prefers_env_over_file_over_default() {
        assert_eq!(
            resolve_endpoint(Some("http://env:1".into()), Some("http://file:2".into())),
            "http://env:1"
        );
        assert_eq!(
            resolve_endpoint(None, Some("http://file:2".into())),
            "http://file:2"
        );
        assert_eq!(resolve_endpoint(None, None), DEFAULT_ENDPOINT);
    }

    #[test]
    fn load_from_reads_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model": "llama3.2:latest"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model(), "llama3.2:latest");
        assert_eq!(config.session_id(), "default");
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn load_from_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ endpoint: oops").unwrap();

        let config = Config::load_from_or_default(&path);
        assert!(config.endpoint.is_none());
        assert_eq!(config.model(), "mistral");
        assert_eq!(config.session_id(), "default");
    }
}
