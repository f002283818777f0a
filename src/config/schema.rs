//! TOML schema for config.toml.
//!
//! This module provides:
//! - The Rust struct mirroring the file
//! - Loading/saving to TOML
//! - Validation
//! - The location of the file on disk

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "KANBAN_CONFIG";

/// Directory under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "kanban-sync";

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// User preferences stored in config.toml.
///
/// Every key is optional; anything missing falls through to the environment
/// or the built-in defaults.
///
/// # Schema
///
/// ```toml
/// api-base = "http://localhost:8080/api"
/// token = "eyJhbGciOi..."
/// user-name = "Ada Lovelace"
/// debounce-ms = 1000
/// request-timeout-secs = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KanbanConfig {
    /// Base URL of the REST API, without a trailing slash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Bearer token attached to every request (sensitive!)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Display name new comments are attributed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Quiet period before a title/description edit is sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,

    /// Per-request timeout of the HTTP client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl KanbanConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(base) = &self.api_base {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(format!("api-base must be an http(s) URL, got '{}'", base));
            }
        }
        if self.request_timeout_secs == Some(0) {
            return Err("request-timeout-secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate().map_err(Error::Config)?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load the config at `path`. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &KanbanConfig) {
        if other.api_base.is_some() {
            self.api_base = other.api_base.clone();
        }
        if other.token.is_some() {
            self.token = other.token.clone();
        }
        if other.user_name.is_some() {
            self.user_name = other.user_name.clone();
        }
        if other.debounce_ms.is_some() {
            self.debounce_ms = other.debounce_ms;
        }
        if other.request_timeout_secs.is_some() {
            self.request_timeout_secs = other.request_timeout_secs;
        }
    }
}

/// Where config.toml lives: `$KANBAN_CONFIG` if set, else
/// `<config dir>/kanban-sync/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
