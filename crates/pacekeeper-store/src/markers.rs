//! One-shot notification markers and activity sentinels
//!
//! A marker records that a one-shot message has already been emitted for a
//! given (event kind, session) pair. Creation is the concurrency guard: the
//! marker is a directory created with an exclusive create, so two
//! near-simultaneous invocations cannot both believe they were first. Any
//! creation failure (pre-existing marker, missing permissions, full disk)
//! is reported as "already notified": losing the race is a normal outcome.

use crate::{FileStore, StoreResult};
use chrono::{DateTime, Utc};
use pacekeeper_config::MessageKind;
use pacekeeper_util::SessionId;
use std::path::PathBuf;

impl FileStore {
    /// Claim the one-shot marker for `(kind, id)`. Returns `true` exactly
    /// once per pair; `false` means another writer won or the claim failed.
    pub fn mark_notified(&self, kind: MessageKind, id: &SessionId) -> bool {
        if std::fs::create_dir_all(&self.scratch_dir).is_err() {
            return false;
        }
        let marker = self.scratch_dir.join(format!("notified.{kind}.{id}"));
        std::fs::create_dir(marker).is_ok()
    }

    /// Remove every notification marker belonging to a session.
    pub fn clear_markers_for(&self, id: &SessionId) {
        let suffix = format!(".{id}");
        let Ok(entries) = std::fs::read_dir(&self.scratch_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with("notified.") && name.ends_with(&suffix) {
                let _ = std::fs::remove_dir(entry.path());
            }
        }
    }

    /// Record the latest activity instant for an open session.
    ///
    /// Written to a sentinel file rather than the ledger so frequent touches
    /// never race the ledger's read-modify-write cycle; the value is folded
    /// into the entry when the session closes.
    pub fn touch_session(&self, id: &SessionId, now: DateTime<Utc>) -> StoreResult<()> {
        std::fs::create_dir_all(&self.scratch_dir)?;
        std::fs::write(self.activity_path(id), format!("{}\n", now.to_rfc3339()))?;
        Ok(())
    }

    /// Read and remove a session's activity sentinel.
    pub(crate) fn take_activity(&self, id: &SessionId) -> Option<String> {
        let path = self.activity_path(id);
        let text = std::fs::read_to_string(&path).ok()?;
        let _ = std::fs::remove_file(&path);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn activity_path(&self, id: &SessionId) -> PathBuf {
        self.scratch_dir.join(format!("activity.{id}"))
    }
}
