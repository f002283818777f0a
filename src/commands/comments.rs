//! Comment commands. Each one opens the task's detail view first.

use serde::Serialize;

use super::{Context, Output, json_line, reported, require_task};
use crate::models::{Comment, CommentId, ProjectId, TaskId};
use crate::remote::RemoteStore;
use crate::sync::BoardSync;
use crate::{Error, Result};

#[derive(Serialize)]
pub struct CommentList {
    pub task_id: TaskId,
    pub task_title: String,
    pub comments: Vec<Comment>,
}

impl Output for CommentList {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        if self.comments.is_empty() {
            return format!("No comments on #{} {}", self.task_id, self.task_title);
        }
        let mut lines = vec![format!(
            "{} comment{} on #{} {}:",
            self.comments.len(),
            if self.comments.len() == 1 { "" } else { "s" },
            self.task_id,
            self.task_title
        )];
        for comment in &self.comments {
            lines.push(format!(
                "  [{}] {} ({}): {}",
                comment.id,
                comment.author,
                comment.created_at.format("%Y-%m-%d %H:%M"),
                comment.text
            ));
        }
        lines.join("\n")
    }
}

#[derive(Serialize)]
pub struct CommentAdded {
    pub comment: Comment,
}

impl Output for CommentAdded {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Added comment {} to task #{} as {}",
            self.comment.id, self.comment.task_id, self.comment.author
        )
    }
}

#[derive(Serialize)]
pub struct CommentDeleted {
    pub task_id: TaskId,
    pub comment_id: CommentId,
}

impl Output for CommentDeleted {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted comment {} from task #{}", self.comment_id, self.task_id)
    }
}

/// Load `project` and open the detail view of `task`.
async fn open_task<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    task: TaskId,
) -> Result<(BoardSync<R>, String)> {
    let board = ctx.loaded_board(project).await?;
    let title = require_task(&board, task)?.title;
    board.store().error().set(None);
    board.select_task(task).await;
    Ok((board, title))
}

/// List the comments of `task`, newest first.
pub async fn comment_list<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    task: TaskId,
) -> Result<CommentList> {
    let (board, task_title) = open_task(ctx, project, task).await?;
    if board.store().error().get().is_some() {
        return Err(reported(&board));
    }
    Ok(CommentList {
        task_id: task,
        task_title,
        comments: board.store().comments().snapshot().to_vec(),
    })
}

/// Comment on `task` as the current user.
pub async fn comment_add<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    task: TaskId,
    text: &str,
) -> Result<CommentAdded> {
    let (board, _) = open_task(ctx, project, task).await?;
    match board.add_comment(text).await {
        Some(comment) => Ok(CommentAdded { comment }),
        None => Err(reported(&board)),
    }
}

/// Delete one of `task`'s comments.
pub async fn comment_delete<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    project: ProjectId,
    task: TaskId,
    comment: CommentId,
) -> Result<CommentDeleted> {
    let (board, _) = open_task(ctx, project, task).await?;
    if board.store().error().get().is_some() {
        return Err(reported(&board));
    }
    if !board.store().comments().contains(comment) {
        return Err(Error::NotFound(format!(
            "Comment {} not found on task #{}",
            comment, task
        )));
    }
    if board.delete_comment(comment).await {
        Ok(CommentDeleted {
            task_id: task,
            comment_id: comment,
        })
    } else {
        Err(reported(&board))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationLevel, Toasts};
    use crate::remote::{MemoryRemoteStore, RemoteOp};
    use crate::session::StaticSession;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Fixture = (
        Context<MemoryRemoteStore>,
        Rc<MemoryRemoteStore>,
        Rc<RefCell<Toasts>>,
    );

    fn context(user: Option<&str>) -> Fixture {
        let remote = Rc::new(MemoryRemoteStore::demo());
        let toasts = Toasts::shared();
        let ctx = Context::new(
            Rc::clone(&remote),
            toasts.clone(),
            Rc::new(StaticSession::new(user.map(str::to_string))),
        );
        (ctx, remote, toasts)
    }

    #[tokio::test]
    async fn test_list_comments() {
        let (ctx, _, _) = context(None);
        let list = comment_list(&ctx, 1, 2).await.unwrap();
        assert_eq!(list.task_title, "Pick a CMS");
        assert_eq!(list.comments.len(), 1);
        assert_eq!(list.comments[0].author, "Grace Hopper");

        let empty = comment_list(&ctx, 1, 3).await.unwrap();
        assert_eq!(empty.to_human(), "No comments on #3 Migrate blog posts");
    }

    #[tokio::test]
    async fn test_list_comments_failure() {
        let (ctx, remote, toasts) = context(None);
        remote.fail(RemoteOp::ListComments);
        let err = comment_list(&ctx, 1, 2).await.err().unwrap();
        assert_eq!(err.to_string(), "Failed to load comments.");
        assert_eq!(
            toasts.borrow().messages_at(NotificationLevel::Error),
            vec!["Failed to load comments."]
        );
    }

    #[tokio::test]
    async fn test_add_comment_author() {
        let (ctx, _, _) = context(Some("Linus"));
        let added = comment_add(&ctx, 1, 3, "  On it ").await.unwrap();
        assert_eq!(added.comment.author, "Linus");
        assert_eq!(added.comment.text, "On it");

        let (ctx, _, _) = context(None);
        let added = comment_add(&ctx, 1, 3, "Me too").await.unwrap();
        assert_eq!(added.comment.author, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_add_blank_comment() {
        let (ctx, remote, toasts) = context(None);
        let err = comment_add(&ctx, 1, 3, "   ").await.err().unwrap();
        assert!(matches!(err, Error::Reported(_)));
        assert!(remote.calls_of(RemoteOp::CreateComment).is_empty());
        assert_eq!(
            toasts.borrow().messages_at(NotificationLevel::Error),
            vec!["Comment text is required."]
        );
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let (ctx, remote, _) = context(None);
        let deleted = comment_delete(&ctx, 1, 2, 1).await.unwrap();
        assert_eq!(deleted.comment_id, 1);
        assert_eq!(remote.calls_of(RemoteOp::DeleteComment).len(), 1);

        let err = comment_delete(&ctx, 1, 2, 1).await.err().unwrap();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_comment_on_unknown_task() {
        let (ctx, remote, _) = context(None);
        let err = comment_add(&ctx, 1, 99, "hi").await.err().unwrap();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(remote.calls_of(RemoteOp::ListComments).is_empty());
    }
}
