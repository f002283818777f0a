//! kb - drive a kanban board with optimistic, debounced sync.

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::path::Path;
use std::process;
use std::rc::Rc;

use clap::Parser;
use kanban_sync::Error;
use kanban_sync::cli::{Cli, Commands, CommentCommands, ConfigCommands, TaskCommands};
use kanban_sync::commands::{self, Context, Output};
use kanban_sync::config::{ConfigOverrides, ResolvedConfig, resolve_config};
use kanban_sync::models::ProjectQuery;
use kanban_sync::notify::{NotificationLevel, Toasts};
use kanban_sync::remote::{HttpRemoteStore, MemoryRemoteStore, RemoteStore};
use kanban_sync::session::StaticSession;
use kanban_sync::sync::SyncOptions;
use tracing_appender::non_blocking::WorkerGuard;

/// Log filter, in `EnvFilter` syntax.
const LOG_ENV: &str = "KANBAN_LOG";

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;
    let guard = setup_tracing(cli.log_file.as_deref());

    let code = match resolve_config(&overrides(&cli)) {
        Ok(config) => run(cli, &config),
        Err(e) => {
            report_error(&e, human);
            1
        }
    };

    // Flush buffered log lines; process::exit skips destructors.
    drop(guard);
    process::exit(code);
}

/// Run the command and print what it produced. Returns the exit code.
fn run(cli: Cli, config: &ResolvedConfig) -> i32 {
    let human = cli.human_readable;
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            report_error(&Error::Io(e), human);
            return 1;
        }
    };

    let toasts = Toasts::shared();
    let local = tokio::task::LocalSet::new();
    let result = local.block_on(
        &runtime,
        execute(cli.command, cli.offline, config, Rc::clone(&toasts), human),
    );

    let notified_error = print_notifications(&toasts, human);
    match result {
        Err(Error::Reported(message)) => {
            tracing::debug!(%message, "command failed after notifying");
            1
        }
        Err(e) => {
            report_error(&e, human);
            1
        }
        Ok(()) if notified_error => 1,
        Ok(()) => 0,
    }
}

async fn execute(
    command: Commands,
    offline: bool,
    config: &ResolvedConfig,
    toasts: Rc<RefCell<Toasts>>,
    human: bool,
) -> kanban_sync::Result<()> {
    let session = Rc::new(StaticSession::new(config.user_name().map(str::to_string)));
    let options = SyncOptions {
        debounce: config.debounce(),
    };

    if offline {
        tracing::info!("using the in-memory demo store");
        let remote = Rc::new(MemoryRemoteStore::demo());
        let ctx = Context::new(remote, toasts, session).with_options(options);
        dispatch(&ctx, command, config, human).await
    } else {
        let remote = Rc::new(HttpRemoteStore::new(
            config.api_base(),
            config.token().map(str::to_string),
            config.request_timeout(),
        )?);
        let ctx = Context::new(remote, toasts, session).with_options(options);
        dispatch(&ctx, command, config, human).await
    }
}

async fn dispatch<R: RemoteStore + 'static>(
    ctx: &Context<R>,
    command: Commands,
    config: &ResolvedConfig,
    human: bool,
) -> kanban_sync::Result<()> {
    match command {
        Commands::Board { project } => {
            let result = commands::board(ctx, project).await?;
            output(&result, human);
        }
        Commands::Move {
            project,
            task,
            status,
        } => {
            let result = commands::move_task(ctx, project, task, status).await?;
            output(&result, human);
        }
        Commands::Edit {
            project,
            task,
            title,
            description,
        } => {
            let result = commands::edit(ctx, project, task, title, description).await?;
            output(&result, human);
        }
        Commands::Assign {
            project,
            task,
            user,
        } => {
            let result = commands::assign(ctx, project, task, user).await?;
            output(&result, human);
        }
        Commands::Task { command } => match command {
            TaskCommands::Create {
                project,
                title,
                description,
                status,
                assignee,
            } => {
                let result =
                    commands::task_create(ctx, project, title, description, status, assignee)
                        .await?;
                output(&result, human);
            }
            TaskCommands::Delete { project, task } => {
                let result = commands::task_delete(ctx, project, task).await?;
                output(&result, human);
            }
        },
        Commands::Comment { command } => match command {
            CommentCommands::List { project, task } => {
                let result = commands::comment_list(ctx, project, task).await?;
                output(&result, human);
            }
            CommentCommands::Add {
                project,
                task,
                text,
            } => {
                let result = commands::comment_add(ctx, project, task, &text).await?;
                output(&result, human);
            }
            CommentCommands::Delete {
                project,
                task,
                comment,
            } => {
                let result = commands::comment_delete(ctx, project, task, comment).await?;
                output(&result, human);
            }
        },
        Commands::Projects {
            q,
            status,
            page,
            page_size,
        } => {
            let query = ProjectQuery {
                q,
                status,
                page,
                page_size,
            };
            let result = commands::projects(ctx, query).await?;
            output(&result, human);
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(config), human),
        },
    }
    Ok(())
}

/// CLI flags that take precedence over environment and config file.
fn overrides(cli: &Cli) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::new();
    if let Some(api_base) = &cli.api_base {
        overrides = overrides.with_api_base(api_base);
    }
    if let Some(token) = &cli.token {
        overrides = overrides.with_token(token);
    }
    if let Some(name) = &cli.user_name {
        overrides = overrides.with_user_name(name);
    }
    if let Some(ms) = cli.debounce_ms {
        overrides = overrides.with_debounce_ms(ms);
    }
    overrides
}

/// Logs go to stderr, or to `log_file` as JSON lines. Filtered by `KANBAN_LOG`
/// (default `warn`).
fn setup_tracing(log_file: Option<&Path>) -> WorkerGuard {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                let file_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);
                tracing_subscriber::registry()
                    .with(filter)
                    .with(file_layer)
                    .init();
                tracing::debug!(path = %path.display(), "tracing initialized");
                return guard;
            }
            Err(e) => eprintln!("Warning: cannot open log file {}: {}", path.display(), e),
        }
    }

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
    guard
}

/// Print the notifications raised while the command ran, oldest first.
/// Returns whether any of them was an error.
fn print_notifications(toasts: &RefCell<Toasts>, human: bool) -> bool {
    let mut notified_error = false;
    for toast in toasts.borrow_mut().drain() {
        notified_error |= toast.level == NotificationLevel::Error;
        if human {
            eprintln!("{} {}", toast.level.icon(), toast.message);
        } else {
            eprintln!(
                "{}",
                serde_json::json!({ "level": toast.level, "message": toast.message })
            );
        }
    }
    notified_error
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

fn report_error(e: &Error, human: bool) {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
}
