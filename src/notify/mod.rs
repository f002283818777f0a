//! Notifications surfaced to the user.
//!
//! The sync engine reports outcomes through the fire-and-forget [`Notifier`]
//! capability. [`Toasts`] is the stock implementation: a toast stack with
//! per-level expiry and a notification history.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum history entries to keep
const MAX_HISTORY_ENTRIES: usize = 100;

/// Sink for user-facing outcome messages.
///
/// Calls are fire-and-forget; the engine never observes a result.
pub trait Notifier {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn notify_success(&self, message: &str) {
        (**self).notify_success(message)
    }

    fn notify_error(&self, message: &str) {
        (**self).notify_error(message)
    }
}

/// Notifier that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn notify_success(&self, _message: &str) {}
    fn notify_error(&self, _message: &str) {}
}

/// Notification level (determines styling and dismiss timing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Informational message
    Info,
    /// Success message (task created, etc.)
    Success,
    /// Warning message
    Warning,
    /// Error message
    Error,
}

impl NotificationLevel {
    /// Get icon/prefix for this level
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "ℹ",
            NotificationLevel::Success => "✓",
            NotificationLevel::Warning => "⚠",
            NotificationLevel::Error => "✗",
        }
    }

    /// How long a toast of this level stays up.
    pub fn default_duration(&self) -> Duration {
        match self {
            NotificationLevel::Success => Duration::from_millis(3500),
            NotificationLevel::Info => Duration::from_millis(4000),
            NotificationLevel::Warning | NotificationLevel::Error => Duration::from_millis(5000),
        }
    }
}

/// A single toast notification
#[derive(Debug, Clone)]
pub struct Toast {
    /// Unique ID for this toast
    pub id: u64,
    /// Notification level
    pub level: NotificationLevel,
    /// Message content
    pub message: String,
    /// When the toast was created
    pub created_at: Instant,
    /// How long before auto-dismiss (None = manual dismiss only)
    pub duration: Option<Duration>,
    /// Whether this toast has been dismissed
    pub dismissed: bool,
}

impl Toast {
    /// Create a new toast with the level's default timeout
    pub fn new(id: u64, level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id,
            level,
            message: message.into(),
            created_at: Instant::now(),
            duration: Some(level.default_duration()),
            dismissed: false,
        }
    }

    /// Check if this toast should be dismissed due to timeout
    pub fn is_expired(&self) -> bool {
        match self.duration {
            Some(duration) => self.created_at.elapsed() >= duration,
            None => false,
        }
    }

    /// Mark this toast as dismissed
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

/// Entry in the notification history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create from a toast
    pub fn from_toast(toast: &Toast) -> Self {
        Self {
            level: toast.level,
            message: toast.message.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Toast stack and history.
///
/// Shared with the engine as `Rc<RefCell<Toasts>>`, which implements
/// [`Notifier`].
#[derive(Debug)]
pub struct Toasts {
    /// Active toasts (newest first)
    toasts: VecDeque<Toast>,
    /// Notification history (newest first)
    history: VecDeque<HistoryEntry>,
    /// Next toast ID
    next_id: u64,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new()
    }
}

impl Toasts {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            history: VecDeque::new(),
            next_id: 1,
        }
    }

    /// A shareable stack, ready to hand to the engine.
    pub fn shared() -> Rc<RefCell<Toasts>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Add a new notification and return its id
    pub fn show(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let toast = Toast::new(self.next_id, level, message);
        self.next_id += 1;

        self.history.push_front(HistoryEntry::from_toast(&toast));
        if self.history.len() > MAX_HISTORY_ENTRIES {
            self.history.pop_back();
        }

        let id = toast.id;
        self.toasts.push_front(toast);
        id
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.show(NotificationLevel::Info, message)
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.show(NotificationLevel::Success, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> u64 {
        self.show(NotificationLevel::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.show(NotificationLevel::Error, message)
    }

    /// Dismiss a toast by id
    pub fn dismiss(&mut self, id: u64) {
        if let Some(toast) = self.toasts.iter_mut().find(|t| t.id == id) {
            toast.dismiss();
        }
        self.cleanup();
    }

    /// Remove expired and dismissed toasts
    pub fn cleanup(&mut self) {
        self.toasts.retain(|t| !t.dismissed && !t.is_expired());
    }

    /// Take every active toast, oldest first, leaving the stack empty
    pub fn drain(&mut self) -> Vec<Toast> {
        self.toasts.drain(..).rev().collect()
    }

    pub fn has_toasts(&self) -> bool {
        !self.toasts.is_empty()
    }

    /// Messages of the active toasts, newest first
    pub fn messages(&self) -> Vec<String> {
        self.toasts.iter().map(|t| t.message.clone()).collect()
    }

    /// Messages of active toasts at `level`, newest first
    pub fn messages_at(&self, level: NotificationLevel) -> Vec<String> {
        self.toasts
            .iter()
            .filter(|t| t.level == level)
            .map(|t| t.message.clone())
            .collect()
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl Notifier for RefCell<Toasts> {
    fn notify_success(&self, message: &str) {
        self.borrow_mut().success(message);
    }

    fn notify_error(&self, message: &str) {
        self.borrow_mut().error(message);
    }
}
