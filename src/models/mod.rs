//! Data models for board entities.
//!
//! This module defines the records mirrored from the remote store:
//! - `Task` - Work items shown as cards on the board
//! - `Comment` - Discussion attached to a single task
//! - `User` - Reference data used to resolve assignee names
//! - `Project` - The board a set of tasks belongs to
//!
//! and the write-side shapes sent back to it (`TaskDraft`, `CommentDraft`,
//! `ProjectDraft`, `TaskPatch`). Field names follow the REST API's camelCase
//! wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned task identifier.
pub type TaskId = u64;
/// Server-assigned project identifier.
pub type ProjectId = u64;
/// Server-assigned comment identifier.
pub type CommentId = u64;
/// Server-assigned user identifier.
pub type UserId = u64;

/// Column a task lives in.
///
/// Transitions are unconstrained: any status is reachable from any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    /// A value the server sent that is not one of the three board columns.
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// The statuses that have a column on the board, in display order.
    pub const COLUMNS: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Unknown => "unknown",
        }
    }

    /// Column heading for human output.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To do",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Done => "Done",
            TaskStatus::Unknown => "Unknown",
        }
    }

    /// Whether the status maps to a board column.
    pub fn is_column(&self) -> bool {
        !matches!(self, TaskStatus::Unknown)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!(
                "Invalid status '{}'. Valid values: todo, in_progress, done",
                other
            )),
        }
    }
}

/// A task card mirrored from the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Merge a single-field patch into this task.
    pub fn apply(&mut self, patch: &TaskPatch) {
        match patch {
            TaskPatch::Title(title) => self.title = title.clone(),
            TaskPatch::Description(description) => self.description = Some(description.clone()),
            TaskPatch::Status(status) => self.status = *status,
            TaskPatch::Assignee(assignee) => self.assignee_id = *assignee,
            TaskPatch::DueDate(due) => self.due_date = *due,
        }
    }

    /// Current value of `field`, expressed as the patch that would set it.
    pub fn patch_for(&self, field: TaskField) -> TaskPatch {
        match field {
            TaskField::Title => TaskPatch::Title(self.title.clone()),
            TaskField::Description => {
                TaskPatch::Description(self.description.clone().unwrap_or_default())
            }
            TaskField::Status => TaskPatch::Status(self.status),
            TaskField::Assignee => TaskPatch::Assignee(self.assignee_id),
            TaskField::DueDate => TaskPatch::DueDate(self.due_date),
        }
    }
}

/// A comment on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A user that tasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Lifecycle of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
    #[serde(other)]
    Other,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Archived => "archived",
            ProjectStatus::Other => "other",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "archived" => Ok(ProjectStatus::Archived),
            other => Err(format!(
                "Invalid project status '{}'. Valid values: active, archived",
                other
            )),
        }
    }
}

/// A project: the board that owns a set of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

/// One page of a list endpoint.
///
/// Only `items` is guaranteed; the paging fields are present on the paginated
/// endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_last: Option<bool>,
}

impl<T> Page<T> {
    /// A page with no paging metadata.
    pub fn of(items: Vec<T>) -> Self {
        Self {
            items,
            page: None,
            page_size: None,
            is_last: None,
        }
    }
}

/// Filters for listing projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    /// Free-text match on title or description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    pub page: u32,
    pub page_size: u32,
}

/// Default page size of the project list.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

impl Default for ProjectQuery {
    fn default() -> Self {
        Self {
            q: None,
            status: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Body of a task creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assignee_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Todo,
            assignee_id: None,
            due_date: None,
        }
    }
}

/// Body of a comment creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentDraft {
    pub author: String,
    pub text: String,
}

/// Body of a project creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
}

impl ProjectDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: ProjectStatus::Active,
        }
    }
}

/// An editable task field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Title,
    Description,
    Status,
    Assignee,
    DueDate,
}

/// How a field's edits are forwarded to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncClass {
    /// Discrete, low-frequency changes sent as soon as they happen.
    Immediate,
    /// Free-text changes coalesced behind a quiet period.
    Debounced,
}

impl TaskField {
    pub fn sync_class(&self) -> SyncClass {
        match self {
            TaskField::Title | TaskField::Description => SyncClass::Debounced,
            TaskField::Status | TaskField::Assignee | TaskField::DueDate => SyncClass::Immediate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Status => "status",
            TaskField::Assignee => "assignee",
            TaskField::DueDate => "due_date",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A change to exactly one task field, carrying its typed value.
///
/// Serializes to the partial body the update endpoint expects, e.g.
/// `{"status":"in_progress"}` or `{"assigneeId":null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskPatch {
    Title(String),
    Description(String),
    Status(TaskStatus),
    #[serde(rename = "assigneeId")]
    Assignee(Option<UserId>),
    DueDate(Option<DateTime<Utc>>),
}

impl TaskPatch {
    pub fn field(&self) -> TaskField {
        match self {
            TaskPatch::Title(_) => TaskField::Title,
            TaskPatch::Description(_) => TaskField::Description,
            TaskPatch::Status(_) => TaskField::Status,
            TaskPatch::Assignee(_) => TaskField::Assignee,
            TaskPatch::DueDate(_) => TaskField::DueDate,
        }
    }
}
