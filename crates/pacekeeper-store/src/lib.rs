//! Persistence layer for pacekeeper
//!
//! Provides:
//! - Session ledger (append-only JSON, read-modify-write)
//! - Orphan reconciliation for sessions whose process vanished
//! - One-shot notification markers (atomic exclusive-create)
//! - Session-state snapshot (overwritten on every check)
//!
//! There is no daemon and no in-memory shared state: every invocation reads
//! whatever is on disk and writes back a complete replacement. Concurrent
//! invocations are serialized only by filesystem write atomicity; a
//! last-writer-wins race on the ledger is an accepted trade-off. The one
//! place true mutual exclusion is required, notification markers, uses a
//! directory create that fails on pre-existence.

mod ledger;
mod markers;
mod snapshot;

pub use ledger::*;
pub use snapshot::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Store errors. These never escape the engine: callers log them and
/// resolve toward "allow".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// File-backed store rooted in a data directory.
///
/// Layout: `session-ledger.json`, `session-state.json`, and a `scratch/`
/// directory holding notification markers and activity sentinels.
#[derive(Debug, Clone)]
pub struct FileStore {
    ledger_path: PathBuf,
    state_path: PathBuf,
    scratch_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            ledger_path: data_dir.join("session-ledger.json"),
            state_path: data_dir.join("session-state.json"),
            scratch_dir: data_dir.join("scratch"),
        }
    }

    /// Build a store with every location chosen explicitly.
    pub fn with_paths(ledger_path: PathBuf, state_path: PathBuf, scratch_dir: PathBuf) -> Self {
        Self {
            ledger_path,
            state_path,
            scratch_dir,
        }
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }
}
