//! CLI argument definitions for kb.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::{ProjectId, ProjectStatus, TaskId, TaskStatus, UserId};

/// Version string with the commit and build time baked in by build.rs.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("KB_GIT_COMMIT"),
    " ",
    env!("KB_BUILD_TIMESTAMP"),
    ")"
);

/// kb - drive a kanban board from the command line.
///
/// Every command goes through the same optimistic sync engine the board uses:
/// edits apply locally first, text edits are debounced and flushed on exit.
#[derive(Parser, Debug)]
#[command(name = "kb")]
#[command(author, version, long_version = LONG_VERSION, about = "Kanban board client with optimistic, debounced sync", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Base URL of the REST API (overrides KANBAN_API_BASE and config.toml)
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// Bearer token for the REST API (overrides KANBAN_TOKEN and config.toml)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Display name new comments are attributed to (overrides KANBAN_USER)
    #[arg(long = "user", global = true, value_name = "NAME")]
    pub user_name: Option<String>,

    /// Quiet period before title/description edits are sent
    #[arg(long, global = true, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Use an in-memory store seeded with a demo project instead of the API
    #[arg(long, global = true)]
    pub offline: bool,

    /// Write logs to this file instead of stderr (filter with KANBAN_LOG)
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a project's board, grouped by column
    Board {
        /// Project ID
        project: ProjectId,
    },

    /// Move a task to another column (same as dragging its card)
    Move {
        /// Project ID
        project: ProjectId,
        /// Task ID
        task: TaskId,
        /// Target column: todo, in_progress, done
        status: TaskStatus,
    },

    /// Edit a task's title and/or description
    Edit {
        /// Project ID
        project: ProjectId,
        /// Task ID
        task: TaskId,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },

    /// Assign a task to a user, or unassign it with `none`
    Assign {
        /// Project ID
        project: ProjectId,
        /// Task ID
        task: TaskId,
        /// User ID, or `none`
        user: AssigneeArg,
    },

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Comment commands
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// List projects
    Projects {
        /// Free-text filter on title and description
        #[arg(long)]
        q: Option<String>,
        /// Filter by status: active, archived
        #[arg(long)]
        status: Option<ProjectStatus>,
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Projects per page
        #[arg(long, default_value_t = crate::models::DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Create {
        /// Project ID
        project: ProjectId,
        /// Title
        #[arg(long)]
        title: String,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Initial column
        #[arg(long, default_value = "todo")]
        status: TaskStatus,
        /// Assignee user ID
        #[arg(long)]
        assignee: Option<UserId>,
    },

    /// Delete a task
    Delete {
        /// Project ID
        project: ProjectId,
        /// Task ID
        task: TaskId,
    },
}

/// Comment subcommands
#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// List a task's comments, newest first
    List {
        /// Project ID
        project: ProjectId,
        /// Task ID
        task: TaskId,
    },

    /// Comment on a task
    Add {
        /// Project ID
        project: ProjectId,
        /// Task ID
        task: TaskId,
        /// Comment text
        text: String,
    },

    /// Delete a comment
    Delete {
        /// Project ID
        project: ProjectId,
        /// Task ID
        task: TaskId,
        /// Comment ID
        comment: u64,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where each value came from
    Show,
}

/// Assignee argument: a user ID or `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssigneeArg(pub Option<UserId>);

impl std::str::FromStr for AssigneeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Ok(AssigneeArg(None));
        }
        s.parse::<UserId>()
            .map(|id| AssigneeArg(Some(id)))
            .map_err(|_| format!("Invalid assignee '{}'. Expected a user ID or 'none'", s))
    }
}
