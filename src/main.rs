#![forbid(unsafe_code)]

//! Command-line driver for the `task-stack` session stack.
//!
//! Each invocation loads the live stack for its scope from the configured
//! backend, applies one operation, writes the stack back, appends the
//! resulting transitions to the audit log and prints the result as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use task_stack::audit::{AuditEntry, AuditLogger, JsonlAuditWriter};
use task_stack::models::checkpoint::Payload;
use task_stack::models::event::StackEvent;
use task_stack::models::session::SessionOutcome;
use task_stack::persistence::{self, RecoveryStore};
use task_stack::{AppError, GlobalConfig, Result, SessionStackManager};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "task-stack", about = "Interruptible task-session stack", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the stack scope.
    #[arg(long)]
    scope: Option<String>,

    /// Override the storage root.
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Override the maximum nesting depth.
    #[arg(long)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a root task.
    Begin {
        /// Task name.
        name: String,
    },
    /// Suspend the active task and start a nested one.
    Interrupt {
        /// Task name.
        name: String,
    },
    /// Durably record the active task's state.
    Pause,
    /// Record a payload against the active task.
    Checkpoint {
        /// Payload schema tag.
        #[arg(long, default_value = "raw")]
        schema: String,
        /// Inline payload text.
        #[arg(long, conflicts_with = "file")]
        data: Option<String>,
        /// Read the payload from a file.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Finish the nested task and return to the one it interrupted.
    Resume {
        /// Mark the nested task discarded instead of completed.
        #[arg(long)]
        discard: bool,
    },
    /// Finish the root task.
    Finish {
        /// Mark the root task discarded instead of completed.
        #[arg(long)]
        discard: bool,
    },
    /// Enter a new phase of the active task.
    Phase {
        /// Phase name.
        name: String,
    },
    /// Advance the active task's step counter.
    Step,
    /// Print the live stack.
    Status,
    /// Report whether the active task is stale.
    StaleCheck,
    /// Flush the stack for recovery if the active task is orphaned.
    OrphanSweep,
    /// Inspect or act on the recovery snapshot.
    Recovery {
        #[command(subcommand)]
        action: RecoveryAction,
    },
}

#[derive(Debug, Subcommand)]
enum RecoveryAction {
    /// Print the pending recovery snapshot.
    Show,
    /// Install the recovery snapshot as the live stack.
    Restore,
    /// Delete the recovery snapshot.
    Discard,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = load_config(&args)?;
    let scope = config.stack.scope.clone();

    let kv = persistence::open_backend(&config.storage).await?;
    let live = RecoveryStore::with_prefix(Arc::clone(&kv), "live", &scope);

    let (tx, mut rx) = mpsc::channel(config.stack.event_buffer);
    let manager = SessionStackManager::new(config.stack.clone(), kv).with_events(tx);

    manager.load_live(&live).await?;
    let output = execute(&manager, args.command).await?;
    manager.save_live(&live).await?;

    let audit: Option<JsonlAuditWriter> = if config.audit.enabled {
        Some(JsonlAuditWriter::new(config.audit_dir())?)
    } else {
        None
    };
    while let Ok(event) = rx.try_recv() {
        record_event(&scope, &event, audit.as_ref())?;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&output)
            .map_err(|err| AppError::Persistence(format!("failed to render output: {err}")))?
    );
    Ok(())
}

fn load_config(args: &Cli) -> Result<GlobalConfig> {
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };

    if let Some(scope) = &args.scope {
        config.stack.scope.clone_from(scope);
    }
    if let Some(dir) = &args.state_dir {
        config.storage.root.clone_from(dir);
    }
    if let Some(depth) = args.max_depth {
        config.stack.max_depth = depth;
    }

    config.validate()?;
    info!(scope = %config.stack.scope, max_depth = config.stack.max_depth, "configuration loaded");
    Ok(config)
}

async fn execute(manager: &SessionStackManager, command: Command) -> Result<serde_json::Value> {
    match command {
        Command::Begin { name } => to_json(&manager.begin(&name).await?),
        Command::Interrupt { name } => to_json(&manager.interrupt(&name).await?),
        Command::Pause => to_json(&manager.pause().await?),
        Command::Checkpoint { schema, data, file } => {
            let bytes = match (data, file) {
                (Some(text), _) => text.into_bytes(),
                (None, Some(path)) => tokio::fs::read(&path).await.map_err(|err| {
                    AppError::Persistence(format!("failed to read {}: {err}", path.display()))
                })?,
                (None, None) => Vec::new(),
            };
            to_json(&manager.checkpoint(Payload::new(schema, bytes)).await?)
        }
        Command::Resume { discard } => to_json(&manager.resume(outcome(discard)).await?),
        Command::Finish { discard } => to_json(&manager.finish(outcome(discard)).await?),
        Command::Phase { name } => to_json(&manager.advance_phase(&name).await?),
        Command::Step => to_json(&manager.advance_step().await?),
        Command::Status => to_json(&serde_json::json!({
            "progress": manager.current_depth(),
            "sessions": manager.sessions(),
        })),
        Command::StaleCheck => to_json(&manager.stale_check()),
        Command::OrphanSweep => to_json(&manager.orphan_sweep().await?),
        Command::Recovery { action } => match action {
            RecoveryAction::Show => to_json(&manager.pending_recovery().await?),
            RecoveryAction::Restore => {
                let snapshot = manager
                    .pending_recovery()
                    .await?
                    .ok_or_else(|| AppError::NotFound("no recovery snapshot pending".into()))?;
                to_json(&manager.restore_from_recovery(snapshot).await?)
            }
            RecoveryAction::Discard => {
                manager.discard_recovery().await?;
                Ok(serde_json::json!({ "discarded": true }))
            }
        },
    }
}

fn outcome(discard: bool) -> SessionOutcome {
    if discard {
        SessionOutcome::Discarded
    } else {
        SessionOutcome::Completed
    }
}

fn to_json(value: &impl Serialize) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|err| AppError::Persistence(format!("failed to render output: {err}")))
}

fn record_event(scope: &str, event: &StackEvent, audit: Option<&JsonlAuditWriter>) -> Result<()> {
    info!(session_id = event.session_id(), task = event.task(), ?event, "transition");
    if let Some(writer) = audit {
        writer.log_entry(AuditEntry::from_event(scope, event, Utc::now()))?;
    }
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
