//! Board orchestrator.
//!
//! [`BoardSync`] owns the store for one project's board and turns user actions
//! into local mutations plus remote writes:
//!
//! - status, assignee and due-date changes are applied and sent immediately
//! - title and description edits are applied on every keystroke and sent once
//!   the field has been quiet for the debounce period (or on blur)
//! - creates and deletes wait for the server and only then touch local state
//!
//! Every answer to an update overwrites the local task with the server's copy.
//! Failures never escape: they are logged, recorded as the store's error and
//! handed to the [`Notifier`].
//!
//! Remote writes are spawned with `spawn_local`; a `BoardSync` must be driven
//! from inside a `tokio::task::LocalSet`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::pending::PendingWrites;
use super::store::OptimisticStore;
use super::timer::{Timer, TokioTimer};
use super::view::{Board, BoardView, assignee_name};
use crate::models::{
    Comment, CommentDraft, CommentId, ProjectId, SyncClass, Task, TaskDraft, TaskField, TaskId,
    TaskPatch, TaskStatus,
};
use crate::notify::{Notifier, Silent};
use crate::remote::RemoteStore;
use crate::session::{SessionProvider, StaticSession};

/// Quiet period before a text edit is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

const LOAD_PROJECT_FAILED: &str = "Failed to load project.";
const LOAD_TASKS_FAILED: &str = "Failed to load tasks.";
const LOAD_USERS_FAILED: &str = "Failed to load users.";
const LOAD_COMMENTS_FAILED: &str = "Failed to load comments.";
const CREATE_TASK_FAILED: &str = "Failed to create task.";
const UPDATE_TASK_FAILED: &str = "Failed to update task.";
const DELETE_TASK_FAILED: &str = "Failed to delete task.";
const ADD_COMMENT_FAILED: &str = "Failed to add comment.";
const DELETE_COMMENT_FAILED: &str = "Failed to delete comment.";

const TASK_TITLE_REQUIRED: &str = "Task title is required.";
const COMMENT_TEXT_REQUIRED: &str = "Comment text is required.";
const NO_TASK_SELECTED: &str = "No task selected.";

const TASK_CREATED: &str = "Task created.";
const TASK_DELETED: &str = "Task deleted.";
const COMMENT_ADDED: &str = "Comment added.";
const COMMENT_DELETED: &str = "Comment deleted.";

/// Author recorded when neither the session nor the user list names anyone.
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Tunables for a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Quiet period before a debounced field is written
    pub debounce: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Which of the concurrently loaded streams arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub project: bool,
    pub tasks: bool,
    pub users: bool,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.project && self.tasks && self.users
    }
}

/// Where a single task field stands relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPhase {
    /// Nothing waiting and nothing in flight
    Idle,
    /// A local edit is waiting for its quiet period
    Dirty,
    /// A write has been sent and not answered yet
    Flushing,
}

/// Result of dropping a dragged card on a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    /// The task changed column and the write was sent
    Moved {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// The task already lives in the target column
    SameColumn { task_id: TaskId },
    /// The payload named no task on this board
    UnknownTask { task_id: TaskId },
    /// The payload was not a task id
    InvalidPayload,
    /// The target is not a board column
    InvalidTarget,
}

type FieldKey = (TaskId, TaskField);

struct Inner<R> {
    remote: Rc<R>,
    store: Rc<OptimisticStore>,
    pending: PendingWrites<FieldKey, TaskPatch>,
    notifier: Rc<dyn Notifier>,
    session: Rc<dyn SessionProvider>,
    project_id: ProjectId,
    options: SyncOptions,
    selected: Cell<Option<TaskId>>,
    /// Spawned update writes not yet awaited by `settle`
    in_flight: RefCell<Vec<JoinHandle<()>>>,
    /// Unanswered writes per field
    flushing: RefCell<HashMap<FieldKey, usize>>,
}

impl<R: RemoteStore + 'static> Inner<R> {
    /// Record and surface a failed load or write.
    fn fail(&self, message: &str) {
        self.store.set_error(message);
        self.notifier.notify_error(message);
    }

    fn send_update(self: &Rc<Self>, task_id: TaskId, patch: TaskPatch) {
        let key = (task_id, patch.field());
        *self.flushing.borrow_mut().entry(key).or_insert(0) += 1;
        debug!(task_id, field = %key.1, "sending task update");

        let inner = Rc::clone(self);
        let handle = tokio::task::spawn_local(async move {
            let result = inner.remote.update_task(task_id, &patch).await;
            inner.finish_flush(key);
            match result {
                Ok(task) => {
                    debug!(task_id, "reconciling task with server copy");
                    inner.store.tasks().replace(task);
                }
                Err(e) => {
                    warn!(task_id, field = %key.1, error = %e, "task update failed");
                    inner.fail(UPDATE_TASK_FAILED);
                }
            }
        });

        let mut in_flight = self.in_flight.borrow_mut();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    fn schedule_update(self: &Rc<Self>, task_id: TaskId, patch: TaskPatch) {
        let key = (task_id, patch.field());
        debug!(task_id, field = %key.1, "scheduling debounced write");
        let inner = Rc::downgrade(self);
        self.pending
            .schedule(key, patch, self.options.debounce, move |patch| {
                if let Some(inner) = inner.upgrade() {
                    inner.send_update(task_id, patch);
                }
            });
    }

    fn finish_flush(&self, key: FieldKey) {
        let mut flushing = self.flushing.borrow_mut();
        if let Some(count) = flushing.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                flushing.remove(&key);
            }
        }
    }

    fn is_selected(&self, task_id: TaskId) -> bool {
        self.selected.get() == Some(task_id)
    }
}

impl<R> Drop for Inner<R> {
    fn drop(&mut self) {
        let pending = self.pending.len();
        if pending > 0 {
            warn!(
                project_id = self.project_id,
                pending, "board dropped with unsent edits; call close() first"
            );
        }
    }
}

/// Optimistic, debounced mirror of one project's board.
///
/// Debounced edits die with the last clone of the board. Call
/// [`close`](Self::close) before dropping it to send them.
pub struct BoardSync<R> {
    inner: Rc<Inner<R>>,
}

impl<R> Clone for BoardSync<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R> std::fmt::Debug for BoardSync<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardSync")
            .field("project_id", &self.inner.project_id)
            .field("selected", &self.inner.selected.get())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BoardSync`].
///
/// Defaults: tokio timer, silent notifier, anonymous session, fresh store,
/// one second debounce.
pub struct BoardSyncBuilder<R> {
    remote: Rc<R>,
    project_id: ProjectId,
    store: Option<Rc<OptimisticStore>>,
    timer: Option<Rc<dyn Timer>>,
    notifier: Rc<dyn Notifier>,
    session: Rc<dyn SessionProvider>,
    options: SyncOptions,
}

impl<R: RemoteStore + 'static> BoardSyncBuilder<R> {
    pub fn store(mut self, store: Rc<OptimisticStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn timer(mut self, timer: Rc<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    pub fn notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn session(mut self, session: Rc<dyn SessionProvider>) -> Self {
        self.session = session;
        self
    }

    pub fn options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.options.debounce = debounce;
        self
    }

    pub fn build(self) -> BoardSync<R> {
        let timer = self.timer.unwrap_or_else(|| Rc::new(TokioTimer));
        BoardSync {
            inner: Rc::new(Inner {
                remote: self.remote,
                store: self
                    .store
                    .unwrap_or_else(|| Rc::new(OptimisticStore::new())),
                pending: PendingWrites::new(timer),
                notifier: self.notifier,
                session: self.session,
                project_id: self.project_id,
                options: self.options,
                selected: Cell::new(None),
                in_flight: RefCell::new(Vec::new()),
                flushing: RefCell::new(HashMap::new()),
            }),
        }
    }
}

impl<R: RemoteStore + 'static> BoardSync<R> {
    pub fn builder(remote: Rc<R>, project_id: ProjectId) -> BoardSyncBuilder<R> {
        BoardSyncBuilder {
            remote,
            project_id,
            store: None,
            timer: None,
            notifier: Rc::new(Silent),
            session: Rc::new(StaticSession::anonymous()),
            options: SyncOptions::default(),
        }
    }

    /// A board with every default.
    pub fn new(remote: Rc<R>, project_id: ProjectId) -> Self {
        Self::builder(remote, project_id).build()
    }

    pub fn project_id(&self) -> ProjectId {
        self.inner.project_id
    }

    pub fn store(&self) -> &Rc<OptimisticStore> {
        &self.inner.store
    }

    pub fn remote(&self) -> &Rc<R> {
        &self.inner.remote
    }

    pub fn options(&self) -> SyncOptions {
        self.inner.options
    }

    // --- Loading ---

    /// Fetch project, tasks and users concurrently.
    ///
    /// Each stream lands in the store as soon as it arrives; a failed stream
    /// leaves its slot empty and does not hold up the others.
    pub async fn load(&self) -> LoadReport {
        let inner = &self.inner;
        let project_id = inner.project_id;
        inner.store.loading().set(true);

        let project = async {
            match inner.remote.get_project(project_id).await {
                Ok(project) => {
                    inner.store.project().set(Some(project));
                    true
                }
                Err(e) => {
                    warn!(project_id, error = %e, "failed to load project");
                    inner.store.project().set(None);
                    inner.fail(LOAD_PROJECT_FAILED);
                    false
                }
            }
        };

        let tasks = async {
            let loaded = match inner.remote.list_tasks(project_id).await {
                Ok(tasks) => {
                    let hidden = tasks.iter().filter(|t| !t.status.is_column()).count();
                    if hidden > 0 {
                        warn!(project_id, hidden, "tasks with unknown status are not shown");
                    }
                    debug!(project_id, count = tasks.len(), "tasks loaded");
                    inner.store.tasks().replace_all(tasks);
                    true
                }
                Err(e) => {
                    warn!(project_id, error = %e, "failed to load tasks");
                    inner.store.tasks().replace_all(Vec::new());
                    inner.fail(LOAD_TASKS_FAILED);
                    false
                }
            };
            inner.store.loading().set(false);
            loaded
        };

        let users = async {
            match inner.remote.list_users().await {
                Ok(users) => {
                    inner.store.users().replace_all(users);
                    true
                }
                Err(e) => {
                    warn!(error = %e, "failed to load users");
                    inner.store.users().replace_all(Vec::new());
                    inner.fail(LOAD_USERS_FAILED);
                    false
                }
            }
        };

        let (project, tasks, users) = futures::join!(project, tasks, users);
        LoadReport {
            project,
            tasks,
            users,
        }
    }

    // --- Field edits ---

    /// Apply `patch` locally and forward it according to its field's class.
    ///
    /// Returns `false` (and does nothing) if the task is not on the board.
    pub fn edit(&self, task_id: TaskId, patch: TaskPatch) -> bool {
        let inner = &self.inner;
        if !inner.store.tasks().apply_patch(task_id, &patch) {
            debug!(task_id, field = %patch.field(), "edit for unknown task ignored");
            return false;
        }
        match patch.field().sync_class() {
            SyncClass::Immediate => inner.send_update(task_id, patch),
            SyncClass::Debounced => inner.schedule_update(task_id, patch),
        }
        true
    }

    /// Send a waiting edit now (the field lost focus).
    pub fn flush_field(&self, task_id: TaskId, field: TaskField) -> bool {
        self.inner.pending.force_flush(&(task_id, field))
    }

    /// Send every waiting edit now.
    pub fn flush_all(&self) -> usize {
        self.inner.pending.flush_all()
    }

    pub fn field_phase(&self, task_id: TaskId, field: TaskField) -> FieldPhase {
        let key = (task_id, field);
        if self.inner.pending.is_pending(&key) {
            FieldPhase::Dirty
        } else if self.inner.flushing.borrow().contains_key(&key) {
            FieldPhase::Flushing
        } else {
            FieldPhase::Idle
        }
    }

    /// Number of debounced edits waiting for their quiet period.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Wait for every update write sent so far to be answered.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.in_flight.borrow_mut());
            if handles.is_empty() {
                break;
            }
            for result in join_all(handles).await {
                if let Err(e) = result {
                    warn!(error = %e, "task update did not complete");
                }
            }
        }
    }

    /// Flush every waiting edit and wait for the answers.
    pub async fn close(&self) {
        let flushed = self.flush_all();
        if flushed > 0 {
            debug!(flushed, "flushed pending edits on close");
        }
        self.settle().await;
    }

    // --- Drag and drop ---

    /// Transfer payload for dragging `task_id`.
    pub fn drag_payload(&self, task_id: TaskId) -> String {
        task_id.to_string()
    }

    /// Move the dragged task to `target`, as an immediate status change.
    pub fn drop_task(&self, payload: &str, target: TaskStatus) -> DropOutcome {
        if !target.is_column() {
            return DropOutcome::InvalidTarget;
        }
        let task_id = match payload.trim().parse::<TaskId>() {
            Ok(id) if id != 0 => id,
            _ => {
                debug!(payload, "ignoring drop with invalid payload");
                return DropOutcome::InvalidPayload;
            }
        };
        let Some(task) = self.inner.store.tasks().get(task_id) else {
            return DropOutcome::UnknownTask { task_id };
        };
        if task.status == target {
            return DropOutcome::SameColumn { task_id };
        }
        self.edit(task_id, TaskPatch::Status(target));
        DropOutcome::Moved {
            task_id,
            from: task.status,
            to: target,
        }
    }

    // --- Tasks ---

    /// Create a task in this board's project.
    ///
    /// The task is added to the board only once the server has assigned it an
    /// id.
    pub async fn create_task(&self, mut draft: TaskDraft) -> Option<Task> {
        let inner = &self.inner;
        draft.title = draft.title.trim().to_string();
        draft.description = draft.description.trim().to_string();
        if draft.title.is_empty() {
            inner.notifier.notify_error(TASK_TITLE_REQUIRED);
            return None;
        }
        draft.project_id = inner.project_id;

        match inner.remote.create_task(&draft).await {
            Ok(task) => {
                debug!(task_id = task.id, "task created");
                inner.store.tasks().insert(task.clone());
                inner.notifier.notify_success(TASK_CREATED);
                Some(task)
            }
            Err(e) => {
                warn!(error = %e, "failed to create task");
                inner.fail(CREATE_TASK_FAILED);
                None
            }
        }
    }

    /// Delete a task once the server confirms.
    ///
    /// Waiting edits for the task are dropped, and the detail view closes if
    /// it showed this task.
    pub async fn delete_task(&self, task_id: TaskId) -> bool {
        let inner = &self.inner;
        match inner.remote.delete_task(task_id).await {
            Ok(()) => {
                let dropped = inner.pending.cancel_where(|(id, _)| *id == task_id);
                debug!(task_id, dropped, "task deleted");
                inner.store.tasks().remove(task_id);
                if inner.is_selected(task_id) {
                    self.close_detail();
                }
                inner.notifier.notify_success(TASK_DELETED);
                true
            }
            Err(e) => {
                warn!(task_id, error = %e, "failed to delete task");
                inner.fail(DELETE_TASK_FAILED);
                false
            }
        }
    }

    // --- Detail view ---

    /// Open the detail view of `task_id` and load its comments.
    pub async fn select_task(&self, task_id: TaskId) {
        let inner = &self.inner;
        inner.selected.set(Some(task_id));
        inner.store.comments().replace_all(Vec::new());

        let result = inner.remote.list_comments(task_id).await;
        if !inner.is_selected(task_id) {
            debug!(task_id, "discarding comments for task no longer selected");
            return;
        }
        match result {
            Ok(comments) => inner.store.comments().replace_all(comments),
            Err(e) => {
                warn!(task_id, error = %e, "failed to load comments");
                inner.fail(LOAD_COMMENTS_FAILED);
            }
        }
    }

    pub fn close_detail(&self) {
        self.inner.selected.set(None);
        self.inner.store.comments().replace_all(Vec::new());
    }

    pub fn selected_task_id(&self) -> Option<TaskId> {
        self.inner.selected.get()
    }

    /// The selected task as the store currently holds it.
    pub fn selected_task(&self) -> Option<Task> {
        self.inner
            .selected
            .get()
            .and_then(|id| self.inner.store.tasks().get(id))
    }

    // --- Comments ---

    /// Name new comments are attributed to.
    pub fn comment_author(&self) -> String {
        if let Some(name) = self.inner.session.current_user_display_name() {
            return name;
        }
        self.inner
            .store
            .users()
            .snapshot()
            .first()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
    }

    /// Comment on the selected task.
    pub async fn add_comment(&self, text: &str) -> Option<Comment> {
        let inner = &self.inner;
        let Some(task_id) = inner.selected.get() else {
            inner.notifier.notify_error(NO_TASK_SELECTED);
            return None;
        };
        let text = text.trim();
        if text.is_empty() {
            inner.notifier.notify_error(COMMENT_TEXT_REQUIRED);
            return None;
        }
        let draft = CommentDraft {
            author: self.comment_author(),
            text: text.to_string(),
        };

        match inner.remote.create_comment(task_id, &draft).await {
            Ok(comment) => {
                if inner.is_selected(task_id) {
                    inner.store.comments().insert(comment.clone());
                }
                inner.notifier.notify_success(COMMENT_ADDED);
                Some(comment)
            }
            Err(e) => {
                warn!(task_id, error = %e, "failed to add comment");
                inner.fail(ADD_COMMENT_FAILED);
                None
            }
        }
    }

    pub async fn delete_comment(&self, comment_id: CommentId) -> bool {
        let inner = &self.inner;
        match inner.remote.delete_comment(comment_id).await {
            Ok(()) => {
                inner.store.comments().remove(comment_id);
                inner.notifier.notify_success(COMMENT_DELETED);
                true
            }
            Err(e) => {
                warn!(comment_id, error = %e, "failed to delete comment");
                inner.fail(DELETE_COMMENT_FAILED);
                false
            }
        }
    }

    // --- Views ---

    /// Partition of the current tasks.
    pub fn board(&self) -> Board {
        Board::partition(&self.inner.store.tasks().snapshot())
    }

    /// A board partition that follows the store.
    pub fn view(&self) -> BoardView {
        BoardView::new(Rc::clone(&self.inner.store))
    }

    pub fn assignee_name(&self, assignee: Option<crate::models::UserId>) -> String {
        assignee_name(&self.inner.store.users().snapshot(), assignee)
    }
}
