//! kanban-sync - optimistic local state and debounced sync for a kanban board.
//!
//! The crate mirrors server-owned task records into an in-memory store that the
//! board reads from. Local mutations land immediately; remote writes are either
//! sent right away or coalesced behind a quiet period, and server responses are
//! reconciled back into the store.
//!
//! - [`sync`] - the engine: store, pending-write scheduler, board view, orchestrator
//! - [`remote`] - the remote store capability, its REST adapter and an in-memory double
//! - [`notify`] - toast notifications consumed by the engine
//! - [`session`] - the signed-in user, for comment authorship
//! - [`config`] - configuration resolution for the `kb` binary
//! - [`cli`] / [`commands`] - the `kb` command line

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod notify;
pub mod remote;
pub mod session;
pub mod sync;

pub use remote::RemoteError;

/// Library-level error type for kanban-sync operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A failure already surfaced to the user as a notification.
    #[error("{0}")]
    Reported(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for kanban-sync operations.
pub type Result<T> = std::result::Result<T, Error>;
