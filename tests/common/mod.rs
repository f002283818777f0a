//! Common test utilities for kb integration tests.
//!
//! Provides `TestEnv`, which points kb at a config file inside a temp
//! directory and strips any `KANBAN_*` variables inherited from the caller.

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
pub use tempfile::TempDir;

const INHERITED_ENV: [&str; 5] = [
    "KANBAN_API_BASE",
    "KANBAN_TOKEN",
    "KANBAN_USER",
    "KANBAN_DEBOUNCE_MS",
    "KANBAN_LOG",
];

/// A test environment with an isolated config file.
///
/// The config file does not exist until `write_config` is called.
pub struct TestEnv {
    pub config_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.toml")
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.config_path(), contents).unwrap();
    }

    /// kb against the real API settings.
    pub fn kb(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_kb"));
        for name in INHERITED_ENV {
            cmd.env_remove(name);
        }
        cmd.env("KANBAN_CONFIG", self.config_path());
        cmd
    }

    /// kb against the in-memory demo store.
    pub fn kb_offline(&self) -> Command {
        let mut cmd = self.kb();
        cmd.arg("--offline");
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the single JSON document kb printed on stdout.
pub fn parse_json(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).unwrap()
}
