//! Board partitions derived from the task collection.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use super::store::{OptimisticStore, SubscriptionId};
use crate::models::{Task, TaskStatus, User, UserId};

/// Tasks grouped by column.
///
/// Always derived from a task snapshot, never edited directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Board {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
    /// Tasks whose status has no column
    pub hidden: usize,
}

impl Board {
    /// Split `tasks` into columns, keeping collection order within each.
    pub fn partition(tasks: &[Task]) -> Self {
        let mut board = Board::default();
        for task in tasks {
            match task.status {
                TaskStatus::Todo => board.todo.push(task.clone()),
                TaskStatus::InProgress => board.in_progress.push(task.clone()),
                TaskStatus::Done => board.done.push(task.clone()),
                TaskStatus::Unknown => board.hidden += 1,
            }
        }
        board
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
            TaskStatus::Unknown => &[],
        }
    }

    /// Number of tasks shown in some column.
    pub fn visible(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }
}

/// Display name for an assignee.
pub fn assignee_name(users: &[User], assignee: Option<UserId>) -> String {
    match assignee {
        None => "Unassigned".to_string(),
        Some(id) => users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("User #{}", id)),
    }
}

/// A [`Board`] kept current with the store's task collection.
///
/// Recomputed eagerly on every change; unsubscribes when dropped.
pub struct BoardView {
    store: Rc<OptimisticStore>,
    board: Rc<RefCell<Rc<Board>>>,
    subscription: SubscriptionId,
}

impl BoardView {
    pub fn new(store: Rc<OptimisticStore>) -> Self {
        let board = Rc::new(RefCell::new(Rc::new(Board::partition(
            &store.tasks().snapshot(),
        ))));
        let sink = board.clone();
        let subscription = store.tasks().subscribe(move |tasks: &Rc<Vec<Task>>| {
            *sink.borrow_mut() = Rc::new(Board::partition(tasks));
        });
        Self {
            store,
            board,
            subscription,
        }
    }

    /// The partition of the latest task snapshot.
    pub fn current(&self) -> Rc<Board> {
        self.board.borrow().clone()
    }
}

impl Drop for BoardView {
    fn drop(&mut self) {
        self.store.tasks().unsubscribe(self.subscription);
    }
}

impl std::fmt::Debug for BoardView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardView")
            .field("board", &self.board.borrow())
            .finish_non_exhaustive()
    }
}
