//! Board display, moves, field edits and task create/delete.

use serde::Serialize;
use tracing::debug;

use super::{Context, Output, json_line, reported, require_task};
use crate::cli::AssigneeArg;
use crate::models::{ProjectId, Task, TaskDraft, TaskField, TaskId, TaskPatch, TaskStatus, UserId};
use crate::remote::RemoteStore;
use crate::sync::{BoardSync, DropOutcome};
use crate::{Error, Result};

/// A card as shown in a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: TaskId,
    pub title: String,
    pub assignee_id: Option<UserId>,
    pub assignee: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub status: TaskStatus,
    pub label: &'static str,
    pub cards: Vec<Card>,
}

/// The board of one project, column by column.
#[derive(Serialize)]
pub struct BoardResult {
    pub project_id: ProjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub columns: Vec<Column>,
    /// Tasks whose status has no column
    pub hidden: usize,
}

impl Output for BoardResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        match &self.project {
            Some(title) => lines.push(format!("{} (#{})", title, self.project_id)),
            None => lines.push(format!("Project #{}", self.project_id)),
        }
        for column in &self.columns {
            lines.push(String::new());
            lines.push(format!("{} ({})", column.label, column.cards.len()));
            for card in &column.cards {
                lines.push(format!("  #{}  {}  [{}]", card.id, card.title, card.assignee));
            }
        }
        if self.hidden > 0 {
            lines.push(String::new());
            lines.push(format!(
                "{} task{} with an unknown status not shown",
                self.hidden,
                if self.hidden == 1 { "" } else { "s" }
            ));
        }
        lines.join("\n")
    }
}

/// A single task with its assignee resolved.
#[derive(Serialize)]
pub struct TaskResult {
    pub task: Task,
    pub assignee: String,
}

impl TaskResult {
    fn from_board<R: RemoteStore + 'static>(board: &BoardSync<R>, task: Task) -> Self {
        let assignee = board.assignee_name(task.assignee_id);
        Self { task, assignee }
    }
}

impl Output for TaskResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        let task = &self.task;
        let mut lines = vec![
            format!("#{} {} [{}]", task.id, task.title, task.status),
            format!("  Assignee: {}", self.assignee),
        ];
        if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(format!("  Description: {}", description));
        }
        if let Some(due) = task.due_date {
            lines.push(format!("  Due: {}", due.format("%Y-%m-%d")));
        }
        lines.join("\n")
    }
}

/// Outcome of moving a task between columns.
#[derive(Serialize)]
pub struct MoveResult {
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
    /// False when the task already was in the target column
    pub moved: bool,
}

impl Output for MoveResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        if self.moved {
            format!("Moved task #{}: {} -> {}", self.task_id, self.from, self.to)
        } else {
            format!("Task #{} is already in {}", self.task_id, self.to.label())
        }
    }
}

/// Outcome of a title/description edit.
#[derive(Serialize)]
pub struct EditResult {
    pub fields: Vec<TaskField>,
    #[serde(flatten)]
    pub task: TaskResult,
}

impl Output for EditResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        let fields: Vec<&str> = self.fields.iter().map(|f| f.as_str()).collect();
        format!("Updated {}\n{}", fields.join(", "), self.task.to_human())
    }
}

#[derive(Serialize)]
pub struct TaskDeleted {
    pub project_id: ProjectId,
    pub task_id: TaskId,
}

impl Output for TaskDeleted {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted task #{} from project #{}", self.task_id, self.project_id)
    }
}

/// Show the board of `project`.
pub async fn board<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
) -> Result<BoardResult> {
    let board = ctx.loaded_board(project).await?;
    let partition = board.board();
    let columns = TaskStatus::COLUMNS
        .iter()
        .map(|&status| Column {
            status,
            label: status.label(),
            cards: partition
                .column(status)
                .iter()
                .map(|task| Card {
                    id: task.id,
                    title: task.title.clone(),
                    assignee_id: task.assignee_id,
                    assignee: board.assignee_name(task.assignee_id),
                })
                .collect(),
        })
        .collect();
    let title = (*board.store().project().get())
        .as_ref()
        .map(|p| p.title.clone());

    Ok(BoardResult {
        project_id: project,
        project: title,
        columns,
        hidden: partition.hidden,
    })
}

/// Move `task` to the `to` column, as dropping its card there would.
pub async fn move_task<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    task: TaskId,
    to: TaskStatus,
) -> Result<MoveResult> {
    let board = ctx.loaded_board(project).await?;
    board.store().error().set(None);

    let payload = board.drag_payload(task);
    match board.drop_task(&payload, to) {
        DropOutcome::Moved { task_id, from, to } => {
            board.close().await;
            if board.store().error().get().is_some() {
                return Err(reported(&board));
            }
            Ok(MoveResult {
                task_id,
                from,
                to,
                moved: true,
            })
        }
        DropOutcome::SameColumn { task_id } => Ok(MoveResult {
            task_id,
            from: to,
            to,
            moved: false,
        }),
        DropOutcome::UnknownTask { task_id } => Err(Error::NotFound(format!(
            "Task #{} not found in project #{}",
            task_id, project
        ))),
        DropOutcome::InvalidPayload | DropOutcome::InvalidTarget => Err(Error::InvalidInput(
            format!("Cannot move task #{} to {}", task, to),
        )),
    }
}

/// Edit the title and/or description of `task`.
///
/// Both are debounced fields; the edits are flushed before returning, so the
/// result reflects what the server stored.
pub async fn edit<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    task: TaskId,
    title: Option<String>,
    description: Option<String>,
) -> Result<EditResult> {
    if title.is_none() && description.is_none() {
        return Err(Error::InvalidInput(
            "Nothing to edit. Pass --title and/or --description".to_string(),
        ));
    }
    let board = ctx.loaded_board(project).await?;
    require_task(&board, task)?;
    board.store().error().set(None);

    let mut patches = Vec::new();
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("Title cannot be empty".to_string()));
        }
        patches.push(TaskPatch::Title(title));
    }
    if let Some(description) = description {
        patches.push(TaskPatch::Description(description));
    }
    let fields = patches.iter().map(|p| p.field()).collect();
    for patch in patches {
        board.edit(task, patch);
    }
    debug!(task_id = task, pending = board.pending_count(), "flushing edits");
    board.close().await;

    if board.store().error().get().is_some() {
        return Err(reported(&board));
    }
    let updated = require_task(&board, task)?;
    Ok(EditResult {
        fields,
        task: TaskResult::from_board(&board, updated),
    })
}

/// Assign `task` to a user, or clear its assignee.
pub async fn assign<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    task: TaskId,
    assignee: AssigneeArg,
) -> Result<TaskResult> {
    let board = ctx.loaded_board(project).await?;
    require_task(&board, task)?;
    if let Some(user) = assignee.0 {
        let users = board.store().users().snapshot();
        if !users.is_empty() && !users.iter().any(|u| u.id == user) {
            return Err(Error::NotFound(format!("User #{} not found", user)));
        }
    }
    board.store().error().set(None);

    board.edit(task, TaskPatch::Assignee(assignee.0));
    board.close().await;

    if board.store().error().get().is_some() {
        return Err(reported(&board));
    }
    let updated = require_task(&board, task)?;
    Ok(TaskResult::from_board(&board, updated))
}

/// Create a task in `project`.
pub async fn task_create<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    assignee: Option<UserId>,
) -> Result<TaskResult> {
    let board = ctx.loaded_board(project).await?;
    let draft = TaskDraft {
        description: description.unwrap_or_default(),
        status,
        assignee_id: assignee,
        ..TaskDraft::new(project, title)
    };
    match board.create_task(draft).await {
        Some(task) => Ok(TaskResult::from_board(&board, task)),
        None => Err(reported(&board)),
    }
}

/// Delete `task` from `project`.
pub async fn task_delete<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    task: TaskId,
) -> Result<TaskDeleted> {
    let board = ctx.loaded_board(project).await?;
    require_task(&board, task)?;
    if board.delete_task(task).await {
        Ok(TaskDeleted {
            project_id: project,
            task_id: task,
        })
    } else {
        Err(reported(&board))
    }
}
