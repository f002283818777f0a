//! The optimistic sync engine.
//!
//! Leaves first:
//! - [`timer`] - injectable deferred callbacks (tokio-backed or virtual)
//! - [`pending`] - per-key debounced writes
//! - [`store`] - observable collections mutated synchronously
//! - [`view`] - board partitions derived from the task collection
//! - [`board`] - the orchestrator wiring user actions to store and remote
//! - [`projects`] - the paged project list

pub mod board;
pub mod pending;
pub mod projects;
pub mod store;
pub mod timer;
pub mod view;

pub use board::{
    BoardSync, BoardSyncBuilder, DEFAULT_DEBOUNCE, DropOutcome, FieldPhase, LoadReport, SyncOptions,
};
pub use pending::PendingWrites;
pub use projects::ProjectBrowser;
pub use store::{Collection, Observable, OptimisticStore, Record, SubscriptionId};
pub use timer::{ManualTimer, Timer, TimerHandle, TokioTimer};
pub use view::{Board, BoardView, assignee_name};
