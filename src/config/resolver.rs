//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`KANBAN_API_BASE`, `KANBAN_TOKEN`, `KANBAN_USER`,
//!    `KANBAN_DEBOUNCE_MS`)
//! 3. config.toml
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::schema::{KanbanConfig, config_path};
use crate::{Error, Result};

pub const API_BASE_ENV: &str = "KANBAN_API_BASE";
pub const TOKEN_ENV: &str = "KANBAN_TOKEN";
pub const USER_ENV: &str = "KANBAN_USER";
pub const DEBOUNCE_ENV: &str = "KANBAN_DEBOUNCE_MS";

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.toml
    File,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::File => write!(f, "file"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_base: Resolved<String>,
    /// Bearer token; never display it unmasked
    pub token: Option<Resolved<String>>,
    pub user_name: Option<Resolved<String>>,
    pub debounce_ms: Resolved<u64>,
    pub request_timeout_secs: Resolved<u64>,
    /// The file that was consulted, if any
    pub path: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            api_base: Resolved::new(DEFAULT_API_BASE.to_string(), ValueSource::Default),
            token: None,
            user_name: None,
            debounce_ms: Resolved::new(DEFAULT_DEBOUNCE_MS, ValueSource::Default),
            request_timeout_secs: Resolved::new(
                DEFAULT_REQUEST_TIMEOUT_SECS,
                ValueSource::Default,
            ),
            path: None,
        }
    }
}

impl ResolvedConfig {
    pub fn api_base(&self) -> &str {
        &self.api_base.value
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|r| r.value.as_str())
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_ref().map(|r| r.value.as_str())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.value)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    /// Get the masked token for display purposes.
    pub fn masked_token(&self) -> Option<String> {
        self.token.as_ref().map(|r| mask_token(&r.value))
    }
}

/// Keep only enough of a token to recognise it.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        let head: String = chars.iter().take(4).collect();
        format!("{}...", head)
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base: Option<String>,
    pub token: Option<String>,
    pub user_name: Option<String>,
    pub debounce_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = Some(ms);
        self
    }
}

/// Resolve configuration with the full precedence chain, reading config.toml
/// from [`config_path`] and the process environment.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let path = config_path();
    let file = match &path {
        Some(path) => KanbanConfig::load(path)?,
        None => KanbanConfig::new(),
    };
    let mut resolved = resolve_with(&file, overrides, |name| std::env::var(name).ok())?;
    resolved.path = path;
    Ok(resolved)
}

/// Resolve from an already-loaded file and an environment lookup.
pub fn resolve_with(
    file: &KanbanConfig,
    overrides: &ConfigOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let env_value = |name: &str| env(name).filter(|v| !v.trim().is_empty());
    let from_env = |name: &str| ValueSource::EnvVar(name.to_string());
    let mut result = ResolvedConfig::default();

    // api_base
    if let Some(ref base) = overrides.api_base {
        result.api_base = Resolved::new(base.clone(), ValueSource::CliFlag);
    } else if let Some(base) = env_value(API_BASE_ENV) {
        result.api_base = Resolved::new(base, from_env(API_BASE_ENV));
    } else if let Some(ref base) = file.api_base {
        result.api_base = Resolved::new(base.clone(), ValueSource::File);
    }
    result.api_base.value = result.api_base.value.trim_end_matches('/').to_string();

    // token: no default
    if let Some(ref token) = overrides.token {
        result.token = Some(Resolved::new(token.clone(), ValueSource::CliFlag));
    } else if let Some(token) = env_value(TOKEN_ENV) {
        result.token = Some(Resolved::new(token, from_env(TOKEN_ENV)));
    } else if let Some(ref token) = file.token {
        result.token = Some(Resolved::new(token.clone(), ValueSource::File));
    }

    // user_name: no default
    if let Some(ref name) = overrides.user_name {
        result.user_name = Some(Resolved::new(name.clone(), ValueSource::CliFlag));
    } else if let Some(name) = env_value(USER_ENV) {
        result.user_name = Some(Resolved::new(name, from_env(USER_ENV)));
    } else if let Some(ref name) = file.user_name {
        result.user_name = Some(Resolved::new(name.clone(), ValueSource::File));
    }

    // debounce_ms
    if let Some(ms) = overrides.debounce_ms {
        result.debounce_ms = Resolved::new(ms, ValueSource::CliFlag);
    } else if let Some(raw) = env_value(DEBOUNCE_ENV) {
        let ms = raw.trim().parse::<u64>().map_err(|_| {
            Error::Config(format!("{} must be a number of milliseconds, got '{}'", DEBOUNCE_ENV, raw))
        })?;
        result.debounce_ms = Resolved::new(ms, from_env(DEBOUNCE_ENV));
    } else if let Some(ms) = file.debounce_ms {
        result.debounce_ms = Resolved::new(ms, ValueSource::File);
    }

    // request_timeout_secs: file only
    if let Some(secs) = file.request_timeout_secs {
        result.request_timeout_secs = Resolved::new(secs, ValueSource::File);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    // ==================== ValueSource Tests ====================

    #[test]
    fn test_value_source_display() {
        assert_eq!(
            format!("{}", ValueSource::EnvVar("FOO".to_string())),
            "env:FOO"
        );
        assert_eq!(format!("{}", ValueSource::File), "file");
        assert_eq!(format!("{}", ValueSource::CliFlag), "cli");
        assert_eq!(format!("{}", ValueSource::Default), "default");
    }

    // ==================== Resolution Tests ====================

    #[test]
    fn test_resolve_defaults() {
        let config = resolve_with(&KanbanConfig::new(), &ConfigOverrides::new(), no_env).unwrap();

        assert_eq!(config.api_base(), "http://localhost:8080/api");
        assert_eq!(config.api_base.source, ValueSource::Default);
        assert!(config.token().is_none());
        assert!(config.user_name().is_none());
        assert_eq!(config.debounce(), Duration::from_millis(1000));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_from_file() {
        let file = KanbanConfig {
            api_base: Some("https://board.example.com/api/".to_string()),
            token: Some("file-token".to_string()),
            user_name: Some("Ada".to_string()),
            debounce_ms: Some(400),
            request_timeout_secs: Some(10),
        };
        let config = resolve_with(&file, &ConfigOverrides::new(), no_env).unwrap();

        assert_eq!(config.api_base(), "https://board.example.com/api");
        assert_eq!(config.api_base.source, ValueSource::File);
        assert_eq!(config.token(), Some("file-token"));
        assert_eq!(config.user_name(), Some("Ada"));
        assert_eq!(config.debounce_ms.value, 400);
        assert_eq!(config.debounce_ms.source, ValueSource::File);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = KanbanConfig {
            token: Some("file-token".to_string()),
            debounce_ms: Some(400),
            ..Default::default()
        };
        let env = env_of(&[(TOKEN_ENV, "env-token"), (DEBOUNCE_ENV, "250")]);
        let config = resolve_with(&file, &ConfigOverrides::new(), env).unwrap();

        assert_eq!(config.token(), Some("env-token"));
        assert_eq!(
            config.token.as_ref().unwrap().source,
            ValueSource::EnvVar(TOKEN_ENV.to_string())
        );
        assert_eq!(config.debounce_ms.value, 250);
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = env_of(&[(API_BASE_ENV, "http://env/api"), (USER_ENV, "Env User")]);
        let overrides = ConfigOverrides::new()
            .with_api_base("http://cli/api")
            .with_user_name("Cli User")
            .with_debounce_ms(50);
        let config = resolve_with(&KanbanConfig::new(), &overrides, env).unwrap();

        assert_eq!(config.api_base(), "http://cli/api");
        assert_eq!(config.api_base.source, ValueSource::CliFlag);
        assert_eq!(config.user_name(), Some("Cli User"));
        assert_eq!(config.debounce_ms.value, 50);
        assert_eq!(config.debounce_ms.source, ValueSource::CliFlag);
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let file = KanbanConfig {
            user_name: Some("Ada".to_string()),
            ..Default::default()
        };
        let config = resolve_with(&file, &ConfigOverrides::new(), env_of(&[(USER_ENV, " ")])).unwrap();
        assert_eq!(config.user_name(), Some("Ada"));
    }

    #[test]
    fn test_bad_debounce_env() {
        let err = resolve_with(
            &KanbanConfig::new(),
            &ConfigOverrides::new(),
            env_of(&[(DEBOUNCE_ENV, "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_masked_token() {
        assert_eq!(mask_token("ghp_xxxxxxxxxxxxxxxxxxxx"), "ghp_...xxxx");
        assert_eq!(mask_token("short"), "shor...");
        let config = resolve_with(
            &KanbanConfig::new(),
            &ConfigOverrides::new().with_token("abcdefghijklmnop"),
            no_env,
        )
        .unwrap();
        assert_eq!(config.masked_token().as_deref(), Some("abcd...mnop"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_reads_file_from_env_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "user-name = \"Grace\"\ndebounce-ms = 750\n").unwrap();

        // SAFETY: serialized with every other test touching the environment
        unsafe {
            std::env::set_var(super::super::schema::CONFIG_PATH_ENV, &path);
            std::env::remove_var(USER_ENV);
            std::env::remove_var(DEBOUNCE_ENV);
        }
        let config = resolve_config(&ConfigOverrides::new()).unwrap();
        unsafe { std::env::remove_var(super::super::schema::CONFIG_PATH_ENV) };

        assert_eq!(config.user_name(), Some("Grace"));
        assert_eq!(config.debounce_ms.value, 750);
        assert_eq!(config.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_resolve_config_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not toml = =").unwrap();

        unsafe { std::env::set_var(super::super::schema::CONFIG_PATH_ENV, &path) };
        let result = resolve_config(&ConfigOverrides::new());
        unsafe { std::env::remove_var(super::super::schema::CONFIG_PATH_ENV) };

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
