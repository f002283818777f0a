//! Configuration for the `kb` binary.
//!
//! A single TOML file holds user preferences:
//!
//! Located at `$KANBAN_CONFIG`, or `<config dir>/kanban-sync/config.toml`
//! (`~/.config/kanban-sync/config.toml` on Linux).
//!
//! Contains:
//! - `api-base` - Base URL of the REST API
//! - `token` - Bearer token for the API (masked whenever displayed)
//! - `user-name` - Display name comments are attributed to
//! - `debounce-ms` - Quiet period before text edits are sent
//! - `request-timeout-secs` - HTTP request timeout
//!
//! ## Precedence
//!
//! CLI flag > environment > config.toml > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    API_BASE_ENV, ConfigOverrides, DEBOUNCE_ENV, Resolved, ResolvedConfig, TOKEN_ENV, USER_ENV,
    ValueSource, mask_token, resolve_config, resolve_with,
};
pub use schema::{CONFIG_PATH_ENV, KanbanConfig, config_path};
