//! Configuration loading and management
//!
//! Handles parsing of `taskflow.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::task::{Category, Priority};
use crate::view::{self, Criteria, SortOption, StatusFilter};

pub const CONFIG_FILE_NAME: &str = "taskflow.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Board configuration
    #[serde(default)]
    pub board: BoardConfig,

    /// Initial view criteria
    #[serde(default)]
    pub view: ViewConfig,

    /// Task assistant configuration
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Board-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Seed a new board with the sample tasks
    #[serde(default = "default_true")]
    pub seed_samples: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            seed_samples: default_true(),
        }
    }
}

/// Initial filter and sort settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Sort option: createdAt, dueDate, priority, alphabetical
    #[serde(default = "default_sort")]
    pub sort: String,

    /// Status filter: all, active, completed
    #[serde(default = "default_all")]
    pub status: String,

    /// Category filter: all or a category name
    #[serde(default = "default_all")]
    pub category: String,

    /// Priority filter: all or a priority name
    #[serde(default = "default_all")]
    pub priority: String,
}

fn default_sort() -> String {
    SortOption::CreatedAt.to_string()
}

fn default_all() -> String {
    "all".to_string()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            sort: default_sort(),
            status: default_all(),
            category: default_all(),
            priority: default_all(),
        }
    }
}

impl ViewConfig {
    /// Criteria described by this section (empty search query)
    pub fn criteria(&self) -> Result<Criteria> {
        Ok(Criteria {
            search_query: String::new(),
            status: self.status.parse::<StatusFilter>()?,
            category: view::parse_filter::<Category>(&self.category)?,
            priority: view::parse_filter::<Priority>(&self.priority)?,
            sort: self.sort.parse::<SortOption>()?,
        })
    }

    fn validate(&self) -> Result<()> {
        self.criteria()
            .map(|_| ())
            .map_err(|err| Error::InvalidConfig(format!("view: {err}")))
    }
}

/// Task assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Streaming chat endpoint; the assistant is disabled when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "TASKFLOW_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AssistantConfig {
    /// Bearer token read from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = self.endpoint.as_deref() {
            validate_endpoint(endpoint)?;
        }
        if self.api_key_env.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "assistant.api_key_env cannot be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "assistant.timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check that `endpoint` is an absolute http(s) URL
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = reqwest::Url::parse(endpoint.trim()).map_err(|err| {
        Error::InvalidConfig(format!("assistant.endpoint: invalid url '{endpoint}': {err}"))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::InvalidConfig(format!(
            "assistant.endpoint: unsupported scheme '{other}' (expected http|https)"
        ))),
    }
}

impl Config {
    /// Load configuration from a `taskflow.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform config location, e.g. `~/.config/taskflow/taskflow.toml`
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "taskflow")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist and be valid. The platform default path is
    /// optional; a missing or unreadable file falls back to defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        match Self::default_path() {
            Some(path) if path.exists() => match Self::load(&path) {
                Ok(config) => Ok((config, Some(path))),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                    Ok((Self::default(), None))
                }
            },
            _ => Ok((Self::default(), None)),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.view.validate()?;
        self.assistant.validate()?;
        Ok(())
    }
}
