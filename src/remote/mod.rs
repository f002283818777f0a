//! The remote store of record.
//!
//! [`RemoteStore`] is the capability the sync engine consumes to read and write
//! projects, tasks, comments and users. Every call is asynchronous and answers
//! either the resulting record(s) or a [`RemoteError`]; the engine only cares
//! about success versus failure.
//!
//! Two implementations ship with the crate:
//! - [`HttpRemoteStore`] talks to the REST API with `reqwest`
//! - [`MemoryRemoteStore`] keeps everything in process (tests, `--offline`)
//!
//! The trait is `?Send`: the engine runs on a single thread inside a
//! `LocalSet` and holds `Rc` handles across awaits.

mod http;
mod memory;

pub use http::HttpRemoteStore;
pub use memory::{MemoryRemoteStore, RemoteCall, RemoteOp};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{
    Comment, CommentDraft, CommentId, Page, Project, ProjectDraft, ProjectId, ProjectQuery, Task,
    TaskDraft, TaskId, TaskPatch, User,
};

/// Failure of a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The record does not exist on the server
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request never produced a response (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The store refused the write
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Error body returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Result alias for remote calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Read/write access to the server-owned records, keyed by resource type.
#[async_trait(?Send)]
pub trait RemoteStore {
    // Projects
    async fn list_projects(&self, query: &ProjectQuery) -> RemoteResult<Page<Project>>;
    async fn get_project(&self, id: ProjectId) -> RemoteResult<Project>;
    async fn create_project(&self, draft: &ProjectDraft) -> RemoteResult<Project>;
    async fn delete_project(&self, id: ProjectId) -> RemoteResult<()>;

    // Tasks
    async fn list_tasks(&self, project_id: ProjectId) -> RemoteResult<Vec<Task>>;
    async fn create_task(&self, draft: &TaskDraft) -> RemoteResult<Task>;
    /// Apply a partial update; answers the full record as the server stores it.
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RemoteResult<Task>;
    async fn delete_task(&self, id: TaskId) -> RemoteResult<()>;

    // Comments
    async fn list_comments(&self, task_id: TaskId) -> RemoteResult<Vec<Comment>>;
    async fn create_comment(&self, task_id: TaskId, draft: &CommentDraft)
    -> RemoteResult<Comment>;
    async fn delete_comment(&self, id: CommentId) -> RemoteResult<()>;

    // Users
    async fn list_users(&self) -> RemoteResult<Vec<User>>;
}
