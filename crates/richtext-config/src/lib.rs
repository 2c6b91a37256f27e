use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_CONTENT: &str = "<p></p>";
pub const DEFAULT_CODE_PLACEHOLDER: &str = "Your code here";
pub const DEFAULT_CALLOUT_PLACEHOLDER: &str = "Your callout text here";
pub const DEFAULT_CALLOUT_TYPE: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Editor behaviour knobs. Every field has a default so a partial (or empty)
/// config file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet interval before a burst of typing is committed to history
    pub debounce_ms: u64,
    /// Markup the editor starts with
    pub initial_content: String,
    /// Body of a code block inserted over a collapsed selection
    pub code_placeholder: String,
    /// Body of a callout inserted over a collapsed selection
    pub callout_placeholder: String,
    /// Callout type used when `insert-callout` gets no value
    pub default_callout_type: String,
    /// Maximum number of undo entries kept, unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            initial_content: DEFAULT_CONTENT.to_string(),
            code_placeholder: DEFAULT_CODE_PLACEHOLDER.to_string(),
            callout_placeholder: DEFAULT_CALLOUT_PLACEHOLDER.to_string(),
            default_callout_type: DEFAULT_CALLOUT_TYPE.to_string(),
            history_limit: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load the user config, falling back to defaults when there is none
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/richtext");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
