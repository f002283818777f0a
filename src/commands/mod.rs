//! Command implementations for the kb CLI.
//!
//! Each command drives the same [`BoardSync`] / [`ProjectBrowser`] the board
//! uses and reports a serializable result. Commands are organized by entity:
//! - `board` - board display, moves, field edits, task create/delete
//! - `comments` - comment list/add/delete on a task
//! - `projects` - the paged project list
//! - `config` - resolved configuration

mod board;
mod comments;
mod config;
mod projects;

pub use board::{
    BoardResult, Card, Column, EditResult, MoveResult, TaskDeleted, TaskResult, assign, board,
    edit, move_task, task_create, task_delete,
};
pub use comments::{
    CommentAdded, CommentDeleted, CommentList, comment_add, comment_delete, comment_list,
};
pub use config::{ConfigShow, config_show};
pub use projects::{ProjectList, projects};

use std::rc::Rc;

use crate::models::{ProjectId, Task, TaskId};
use crate::notify::Notifier;
use crate::remote::RemoteStore;
use crate::session::SessionProvider;
use crate::sync::{BoardSync, SyncOptions};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Collaborators every command shares.
pub struct Context<R> {
    pub remote: Rc<R>,
    pub notifier: Rc<dyn Notifier>,
    pub session: Rc<dyn SessionProvider>,
    pub options: SyncOptions,
}

impl<R: RemoteStore + 'static> Context<R> {
    pub fn new(
        remote: Rc<R>,
        notifier: Rc<dyn Notifier>,
        session: Rc<dyn SessionProvider>,
    ) -> Self {
        Self {
            remote,
            notifier,
            session,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// A board for `project`, not yet loaded.
    pub fn board(&self, project: ProjectId) -> BoardSync<R> {
        BoardSync::builder(Rc::clone(&self.remote), project)
            .notifier(Rc::clone(&self.notifier))
            .session(Rc::clone(&self.session))
            .options(self.options)
            .build()
    }

    /// A loaded board for `project`.
    ///
    /// Fails only when the tasks could not be loaded; a missing project title
    /// or user list still leaves a usable board.
    pub async fn loaded_board(&self, project: ProjectId) -> Result<BoardSync<R>> {
        let board = self.board(project);
        let report = board.load().await;
        if !report.tasks {
            return Err(reported(&board));
        }
        Ok(board)
    }
}

/// Serialize a result as a single JSON line.
pub(crate) fn json_line<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// The error the board last reported, as an [`Error::Reported`].
pub(crate) fn reported<R: RemoteStore + 'static>(board: &BoardSync<R>) -> Error {
    let message = board
        .store()
        .error()
        .get()
        .as_deref()
        .unwrap_or("Operation failed.")
        .to_string();
    Error::Reported(message)
}

/// Look up a task on a loaded board.
pub(crate) fn require_task<R: RemoteStore + 'static>(
    board: &BoardSync<R>,
    task: TaskId,
) -> Result<Task> {
    board.store().tasks().get(task).ok_or_else(|| {
        Error::NotFound(format!(
            "Task #{} not found in project #{}",
            task,
            board.project_id()
        ))
    })
}
