//! In-process remote store.
//!
//! Behaves like the REST API (server-assigned ids, newest-first lists, full
//! records returned from writes) while recording every call it receives.
//! Individual operations can be made to fail, and an artificial latency can be
//! configured so writes stay in flight across timer ticks.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::models::{
    Comment, CommentDraft, CommentId, Page, Project, ProjectDraft, ProjectId, ProjectQuery,
    ProjectStatus, Task, TaskDraft, TaskId, TaskPatch, TaskStatus, User,
};

/// Operations a [`MemoryRemoteStore`] records and can fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    ListProjects,
    GetProject,
    CreateProject,
    DeleteProject,
    ListTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ListComments,
    CreateComment,
    DeleteComment,
    ListUsers,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub op: RemoteOp,
    /// Id the call addressed, if any
    pub target: Option<u64>,
    /// Body of an `UpdateTask` call
    pub patch: Option<TaskPatch>,
}

#[derive(Debug, Default)]
struct Records {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    users: Vec<User>,
}

/// Remote store that keeps its records in memory.
#[derive(Debug)]
pub struct MemoryRemoteStore {
    records: RefCell<Records>,
    calls: RefCell<Vec<RemoteCall>>,
    failing: RefCell<HashSet<RemoteOp>>,
    next_id: Cell<u64>,
    latency: Cell<Duration>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    /// Create an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self {
            records: RefCell::new(Records::default()),
            calls: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
            next_id: Cell::new(1),
            latency: Cell::new(Duration::ZERO),
        }
    }

    /// A store seeded with one demo project, three users and a few tasks.
    ///
    /// Backs the `--offline` mode of the CLI.
    pub fn demo() -> Self {
        let store = Self::new();
        let created = |day: u32| -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 1, day, 9, 0, 0)
                .single()
                .unwrap_or_else(Utc::now)
        };
        store.seed_user(User {
            id: 1,
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        });
        store.seed_user(User {
            id: 2,
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
        });
        store.seed_user(User {
            id: 3,
            name: "Alan Turing".to_string(),
            email: "alan@example.com".to_string(),
        });
        store.seed_project(Project {
            id: 1,
            title: "Website relaunch".to_string(),
            description: "Move the marketing site to the new stack".to_string(),
            status: ProjectStatus::Active,
            created_at: created(2),
        });
        store.seed_project(Project {
            id: 2,
            title: "Mobile app".to_string(),
            description: "Companion app for the board".to_string(),
            status: ProjectStatus::Archived,
            created_at: created(3),
        });
        let tasks = [
            (1, "Draft sitemap", TaskStatus::Done, Some(1)),
            (2, "Pick a CMS", TaskStatus::InProgress, Some(2)),
            (3, "Migrate blog posts", TaskStatus::Todo, None),
            (4, "Set up redirects", TaskStatus::Todo, Some(9)),
        ];
        for (id, title, status, assignee_id) in tasks {
            store.seed_task(Task {
                id,
                project_id: 1,
                title: title.to_string(),
                description: None,
                status,
                assignee_id,
                due_date: None,
                created_at: created(4 + id as u32),
            });
        }
        store.seed_comment(Comment {
            id: 1,
            task_id: 2,
            author: "Grace Hopper".to_string(),
            text: "Shortlisted two candidates".to_string(),
            created_at: created(10),
        });
        store.set_next_id(100);
        store
    }

    /// Set the id the next created record receives.
    pub fn set_next_id(&self, id: u64) {
        self.next_id.set(id);
    }

    /// Delay every call by `latency` (uses tokio time).
    pub fn set_latency(&self, latency: Duration) {
        self.latency.set(latency);
    }

    /// Make every call of `op` fail until [`recover`](Self::recover) is called.
    pub fn fail(&self, op: RemoteOp) {
        self.failing.borrow_mut().insert(op);
    }

    /// Stop failing `op`.
    pub fn recover(&self, op: RemoteOp) {
        self.failing.borrow_mut().remove(&op);
    }

    /// Insert a project as if it already existed on the server (newest first).
    pub fn seed_project(&self, project: Project) {
        self.records.borrow_mut().projects.insert(0, project);
    }

    /// Insert a task as if it already existed on the server (newest first).
    pub fn seed_task(&self, task: Task) {
        self.records.borrow_mut().tasks.insert(0, task);
    }

    /// Insert a comment as if it already existed on the server (newest first).
    pub fn seed_comment(&self, comment: Comment) {
        self.records.borrow_mut().comments.insert(0, comment);
    }

    pub fn seed_user(&self, user: User) {
        self.records.borrow_mut().users.push(user);
    }

    /// Change a stored task behind the client's back.
    pub fn mutate_task(&self, id: TaskId, f: impl FnOnce(&mut Task)) {
        if let Some(task) = self.records.borrow_mut().tasks.iter_mut().find(|t| t.id == id) {
            f(task);
        }
    }

    /// The server's copy of a task.
    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.records.borrow().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Every recorded call, oldest first.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.borrow().clone()
    }

    /// Recorded calls of one kind, oldest first.
    pub fn calls_of(&self, op: RemoteOp) -> Vec<RemoteCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Record the call, wait out the latency, then fail if `op` is failing.
    async fn enter(
        &self,
        op: RemoteOp,
        target: Option<u64>,
        patch: Option<TaskPatch>,
    ) -> RemoteResult<()> {
        self.calls
            .borrow_mut()
            .push(RemoteCall { op, target, patch });
        let latency = self.latency.get();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.failing.borrow().contains(&op) {
            return Err(RemoteError::Transport(format!("{:?} unavailable", op)));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl RemoteStore for MemoryRemoteStore {
    async fn list_projects(&self, query: &ProjectQuery) -> RemoteResult<Page<Project>> {
        self.enter(RemoteOp::ListProjects, None, None).await?;
        let records = self.records.borrow();
        let needle = query.q.as_deref().map(str::to_lowercase);
        let matching: Vec<&Project> = records
            .projects
            .iter()
            .filter(|p| match &needle {
                Some(n) => {
                    p.title.to_lowercase().contains(n) || p.description.to_lowercase().contains(n)
                }
                None => true,
            })
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .collect();
        let page = query.page.max(1);
        let page_size = query.page_size.clamp(1, 100);
        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let items = matching
            .iter()
            .skip(start)
            .take(page_size as usize)
            .map(|p| (*p).clone())
            .collect();
        Ok(Page {
            items,
            page: Some(page),
            page_size: Some(page_size),
            is_last: Some(start.saturating_add(page_size as usize) >= matching.len()),
        })
    }

    async fn get_project(&self, id: ProjectId) -> RemoteResult<Project> {
        self.enter(RemoteOp::GetProject, Some(id), None).await?;
        self.records
            .borrow()
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound("project not found".to_string()))
    }

    async fn create_project(&self, draft: &ProjectDraft) -> RemoteResult<Project> {
        self.enter(RemoteOp::CreateProject, None, None).await?;
        if draft.title.trim().is_empty() {
            return Err(RemoteError::Rejected("title is required".to_string()));
        }
        let project = Project {
            id: self.allocate_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: draft.status,
            created_at: Utc::now(),
        };
        self.records.borrow_mut().projects.insert(0, project.clone());
        Ok(project)
    }

    async fn delete_project(&self, id: ProjectId) -> RemoteResult<()> {
        self.enter(RemoteOp::DeleteProject, Some(id), None).await?;
        let mut records = self.records.borrow_mut();
        records.projects.retain(|p| p.id != id);
        records.tasks.retain(|t| t.project_id != id);
        Ok(())
    }

    async fn list_tasks(&self, project_id: ProjectId) -> RemoteResult<Vec<Task>> {
        self.enter(RemoteOp::ListTasks, Some(project_id), None)
            .await?;
        Ok(self
            .records
            .borrow()
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, draft: &TaskDraft) -> RemoteResult<Task> {
        self.enter(RemoteOp::CreateTask, Some(draft.project_id), None)
            .await?;
        if draft.title.trim().is_empty() {
            return Err(RemoteError::Rejected("title is required".to_string()));
        }
        let task = Task {
            id: self.allocate_id(),
            project_id: draft.project_id,
            title: draft.title.clone(),
            description: Some(draft.description.clone()),
            status: draft.status,
            assignee_id: draft.assignee_id,
            due_date: draft.due_date,
            created_at: Utc::now(),
        };
        self.records.borrow_mut().tasks.insert(0, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RemoteResult<Task> {
        self.enter(RemoteOp::UpdateTask, Some(id), Some(patch.clone()))
            .await?;
        let mut records = self.records.borrow_mut();
        let task = records
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| RemoteError::NotFound("task not found".to_string()))?;
        task.apply(patch);
        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> RemoteResult<()> {
        self.enter(RemoteOp::DeleteTask, Some(id), None).await?;
        let mut records = self.records.borrow_mut();
        records.tasks.retain(|t| t.id != id);
        records.comments.retain(|c| c.task_id != id);
        Ok(())
    }

    async fn list_comments(&self, task_id: TaskId) -> RemoteResult<Vec<Comment>> {
        self.enter(RemoteOp::ListComments, Some(task_id), None)
            .await?;
        Ok(self
            .records
            .borrow()
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn create_comment(
        &self,
        task_id: TaskId,
        draft: &CommentDraft,
    ) -> RemoteResult<Comment> {
        self.enter(RemoteOp::CreateComment, Some(task_id), None)
            .await?;
        if !self.records.borrow().tasks.iter().any(|t| t.id == task_id) {
            return Err(RemoteError::NotFound("task not found".to_string()));
        }
        let comment = Comment {
            id: self.allocate_id(),
            task_id,
            author: draft.author.clone(),
            text: draft.text.clone(),
            created_at: Utc::now(),
        };
        self.records.borrow_mut().comments.insert(0, comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: CommentId) -> RemoteResult<()> {
        self.enter(RemoteOp::DeleteComment, Some(id), None).await?;
        self.records.borrow_mut().comments.retain(|c| c.id != id);
        Ok(())
    }

    async fn list_users(&self) -> RemoteResult<Vec<User>> {
        self.enter(RemoteOp::ListUsers, None, None).await?;
        Ok(self.records.borrow().users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_task_assigns_id_and_prepends() {
        let store = MemoryRemoteStore::demo();
        store.set_next_id(42);
        let task = store
            .create_task(&TaskDraft::new(1, "Spec"))
            .await
            .unwrap();
        assert_eq!(task.id, 42);
        assert_eq!(task.status, TaskStatus::Todo);
        let listed = store.list_tasks(1).await.unwrap();
        assert_eq!(listed[0].id, 42);
    }

    #[tokio::test]
    async fn test_update_returns_full_record() {
        let store = MemoryRemoteStore::demo();
        let task = store
            .update_task(3, &TaskPatch::Status(TaskStatus::Done))
            .await
            .unwrap();
        assert_eq!(task.id, 3);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, "Migrate blog posts");
        assert_eq!(
            store.calls_of(RemoteOp::UpdateTask),
            vec![RemoteCall {
                op: RemoteOp::UpdateTask,
                target: Some(3),
                patch: Some(TaskPatch::Status(TaskStatus::Done)),
            }]
        );
    }

    #[tokio::test]
    async fn test_update_missing_task_is_not_found() {
        let store = MemoryRemoteStore::new();
        let err = store
            .update_task(9, &TaskPatch::Title("x".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryRemoteStore::demo();
        store.fail(RemoteOp::ListUsers);
        assert!(store.list_users().await.is_err());
        store.recover(RemoteOp::ListUsers);
        assert_eq!(store.list_users().await.unwrap().len(), 3);
        assert_eq!(store.calls_of(RemoteOp::ListUsers).len(), 2);
    }

    #[tokio::test]
    async fn test_list_projects_filters_and_pages() {
        let store = MemoryRemoteStore::demo();
        let all = store
            .list_projects(&ProjectQuery::default())
            .await
            .unwrap();
        assert_eq!(all.items.len(), 2);
        assert_eq!(all.is_last, Some(true));

        let archived = store
            .list_projects(&ProjectQuery {
                status: Some(ProjectStatus::Archived),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(archived.items.len(), 1);
        assert_eq!(archived.items[0].title, "Mobile app");

        let first = store
            .list_projects(&ProjectQuery {
                q: Some("WEBSITE".to_string()),
                page: 1,
                page_size: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.is_last, Some(true));

        let paged = store
            .list_projects(&ProjectQuery {
                page: 1,
                page_size: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paged.is_last, Some(false));
    }

    #[tokio::test]
    async fn test_list_projects_past_the_end() {
        let store = MemoryRemoteStore::demo();
        let page = store
            .list_projects(&ProjectQuery {
                page: u32::MAX,
                page_size: 100,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page, Some(u32::MAX));
        assert_eq!(page.is_last, Some(true));
    }

    #[tokio::test]
    async fn test_comment_on_unknown_task_fails() {
        let store = MemoryRemoteStore::new();
        let draft = CommentDraft {
            author: "a".to_string(),
            text: "b".to_string(),
        };
        assert!(store.create_comment(5, &draft).await.is_err());
    }
}
