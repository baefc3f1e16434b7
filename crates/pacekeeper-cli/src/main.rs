//! pacekeeper - schedule and break enforcement for bracketed work sessions
//!
//! The launcher calls `pacekeeper check` before starting work and brackets
//! the session with `start-session` / `end-session`. A lighter periodic
//! checker reads the session-state snapshot this binary refreshes; it never
//! re-derives schedule logic itself.
//!
//! Exit codes for `check`: 0 = proceed, 1 = blocked, 2 = wind-down.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pacekeeper_core::{CheckRequest, check};
use pacekeeper_store::FileStore;
use pacekeeper_util::{SessionId, default_data_dir, now_utc, policy_search_paths};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pacekeeper")]
#[command(about = "Working-hours and break enforcement for the human operator", long_about = None)]
struct Cli {
    /// Explicit policy file (default: project, then repo root, then global)
    #[arg(long, env = "PACEKEEPER_POLICY", global = true)]
    policy: Option<PathBuf>,

    /// Data directory override (or set PACEKEEPER_DATA_DIR)
    #[arg(long, env = "PACEKEEPER_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Session-state snapshot location (default: <data-dir>/session-state.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Session ledger location (default: <data-dir>/session-ledger.json)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify the schedule and refresh the session-state snapshot
    Check {
        /// Override any blocking outcome
        #[arg(long)]
        force: bool,
    },
    /// Register a new session and print its id
    StartSession {
        /// Project directory the session runs in
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Mark the session as force-started
        #[arg(long)]
        force: bool,
    },
    /// Mark a session as ended
    EndSession { id: String },
    /// Record activity for an open session
    TouchSession { id: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let store = FileStore::with_paths(
        cli.ledger
            .clone()
            .unwrap_or_else(|| data_dir.join("session-ledger.json")),
        cli.state
            .clone()
            .unwrap_or_else(|| data_dir.join("session-state.json")),
        data_dir.join("scratch"),
    );
    // One clock snapshot per invocation; everything downstream takes it as a
    // parameter and never re-reads the clock
    let now = now_utc();

    match cli.command {
        Command::Check { force } => {
            let paths = match cli.policy {
                Some(explicit) => vec![explicit],
                None => policy_search_paths(),
            };
            let outcome = check(&CheckRequest {
                policy_paths: &paths,
                store: &store,
                force,
                now,
            });
            if let Some(notice) = outcome.notice() {
                eprintln!("{notice}");
            }
            Ok(outcome.exit_code())
        }
        Command::StartSession { dir, force } => {
            let id = store.open_session(&dir, force, now)?;
            println!("{id}");
            Ok(0)
        }
        Command::EndSession { id } => {
            store.close_session(&SessionId::new(id), now)?;
            Ok(0)
        }
        Command::TouchSession { id } => {
            store.touch_session(&SessionId::new(id), now)?;
            Ok(0)
        }
    }
}
