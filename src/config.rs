//! Minimal runtime configuration: environment variables plus an optional
//! TOML file, the teacher's config stack (`vtcode-config/Cargo.toml`
//! depends on `serde` + `toml`). Lives in the binary crate, not
//! `agentkit-core` — configuration loading is an external-collaborator
//! concern the core only defines the seam for.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
struct FileConfig {
    model: Option<String>,
    api_key_env: Option<String>,
    shell_timeout_secs: Option<u64>,
    max_turns: Option<usize>,
    permissions_file: Option<PathBuf>,
}

/// Fully resolved configuration for one run of the binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub api_key_env: String,
    pub shell_timeout_secs: u64,
    pub max_turns: Option<usize>,
    pub permissions_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            shell_timeout_secs: DEFAULT_SHELL_TIMEOUT_SECS,
            max_turns: None,
            permissions_file: default_permissions_file(),
        }
    }
}

fn default_permissions_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".agentkit")
        .join("permissions.json")
}

impl Config {
    /// Loads an optional TOML file, then layers environment variable
    /// overrides on top (env wins — matches the teacher's precedence of
    /// "CLI flags > env > config file > defaults", minus CLI flags which
    /// the caller applies separately).
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                let file_config: FileConfig = toml::from_str(&contents)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?;
                config.apply_file(file_config);
            }
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(api_key_env) = file.api_key_env {
            self.api_key_env = api_key_env;
        }
        if let Some(timeout) = file.shell_timeout_secs {
            self.shell_timeout_secs = timeout;
        }
        if let Some(max_turns) = file.max_turns {
            self.max_turns = Some(max_turns);
        }
        if let Some(permissions_file) = file.permissions_file {
            self.permissions_file = permissions_file;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("AGENTKIT_MODEL") {
            self.model = model;
        }
        if let Ok(api_key_env) = std::env::var("AGENTKIT_API_KEY_ENV") {
            self.api_key_env = api_key_env;
        }
        if let Ok(timeout) = std::env::var("AGENTKIT_SHELL_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse() {
                self.shell_timeout_secs = parsed;
            }
        }
        if let Ok(permissions_file) = std::env::var("AGENTKIT_PERMISSIONS_FILE") {
            self.permissions_file = PathBuf::from(permissions_file);
        }
    }

    /// Reads the API key from whichever environment variable `api_key_env`
    /// names, erroring with that variable's name so the message is
    /// actionable.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .with_context(|| format!("{} is not set", self.api_key_env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_populated() {
        let config = Config::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.shell_timeout_secs, DEFAULT_SHELL_TIMEOUT_SECS);
    }

    #[test]
    fn file_config_overrides_defaults() {
        let mut config = Config::default();
        config.apply_file(FileConfig {
            model: Some("claude-opus-4".to_string()),
            max_turns: Some(10),
            ..Default::default()
        });
        assert_eq!(config.model, "claude-opus-4");
        assert_eq!(config.max_turns, Some(10));
    }
}
