//! Session ledger
//!
//! One entry per bracketed work session. The ledger file is the sole source
//! of truth, shared by every concurrently running invocation on the machine
//! and mutated under a read-modify-write discipline. Timestamps are stored
//! as RFC 3339 strings so a single malformed entry never poisons the rest of
//! the file: bad timestamps are skipped (or conservatively force-closed) at
//! the point of use.

use crate::{FileStore, StoreResult};
use chrono::{DateTime, Utc};
use pacekeeper_util::SessionId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Age beyond which a still-open session is presumed abandoned rather than
/// active. Fixed by design; not a policy field.
pub const ORPHAN_THRESHOLD_HOURS: i64 = 4;

/// One recorded work session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: SessionId,

    /// RFC 3339; kept as text so unparseable values degrade per-entry.
    #[serde(default)]
    pub start_time: String,

    /// RFC 3339; `None` while the session is open.
    #[serde(default)]
    pub end_time: Option<String>,

    /// Working directory the session was opened from.
    #[serde(default)]
    pub project_dir: String,

    /// Whether the session was started past a blocking outcome.
    #[serde(default)]
    pub forced: bool,

    /// Last recorded activity, folded in from the sentinel at close time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
}

impl LedgerEntry {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_time)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end_time.as_deref().and_then(parse_timestamp)
    }
}

/// Parse an RFC 3339 timestamp, normalized to UTC. `None` when malformed.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The on-disk ledger document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub sessions: Vec<LedgerEntry>,
}

impl FileStore {
    /// Load the ledger. A missing, unreadable, or corrupt file is an empty
    /// ledger: never an error, never a block.
    pub fn load_ledger(&self) -> Ledger {
        let Ok(text) = std::fs::read_to_string(&self.ledger_path) else {
            return Ledger::default();
        };
        match serde_json::from_str(&text) {
            Ok(ledger) => ledger,
            Err(err) => {
                warn!(
                    path = %self.ledger_path.display(),
                    error = %err,
                    "Corrupt session ledger, treating as empty"
                );
                Ledger::default()
            }
        }
    }

    fn save_ledger(&self, ledger: &Ledger) -> StoreResult<()> {
        if let Some(parent) = self.ledger_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.ledger_path, serde_json::to_string_pretty(ledger)?)?;
        Ok(())
    }

    /// Register a new session and return its identifier.
    pub fn open_session(
        &self,
        project_dir: &Path,
        forced: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<SessionId> {
        let mut ledger = self.load_ledger();
        let id = SessionId::generate();
        ledger.sessions.push(LedgerEntry {
            id: id.clone(),
            start_time: now.to_rfc3339(),
            end_time: None,
            project_dir: project_dir.display().to_string(),
            forced,
            last_activity: None,
        });
        self.save_ledger(&ledger)?;
        info!(session_id = %id, forced, "Session opened");
        Ok(id)
    }

    /// Mark a session as ended and remove its notification markers.
    ///
    /// Closing an absent or already-closed session is a no-op, not an error:
    /// another invocation (or the reconciler) may have beaten us to it.
    pub fn close_session(&self, id: &SessionId, now: DateTime<Utc>) -> StoreResult<()> {
        let mut ledger = self.load_ledger();
        if let Some(entry) = ledger
            .sessions
            .iter_mut()
            .find(|s| &s.id == id && s.is_open())
        {
            let end = now.to_rfc3339();
            entry.last_activity = Some(self.take_activity(id).unwrap_or_else(|| end.clone()));
            entry.end_time = Some(end);
            self.save_ledger(&ledger)?;
            info!(session_id = %id, "Session closed");
        }
        self.clear_markers_for(id);
        Ok(())
    }

    /// Force-close every open session that outlived the staleness threshold
    /// or whose start timestamp cannot be parsed, using its own start time as
    /// a conservative end time. Returns the number of sessions closed.
    pub fn reconcile_orphans(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut ledger = self.load_ledger();
        let threshold = chrono::Duration::hours(ORPHAN_THRESHOLD_HOURS);
        let mut closed = Vec::new();

        for entry in ledger.sessions.iter_mut().filter(|s| s.is_open()) {
            match entry.start() {
                Some(start) => {
                    if now.signed_duration_since(start) > threshold {
                        entry.end_time = Some(entry.start_time.clone());
                        closed.push(entry.id.clone());
                    }
                }
                None => {
                    // Unparseable start: close at whatever was recorded
                    let end = if entry.start_time.is_empty() {
                        now.to_rfc3339()
                    } else {
                        entry.start_time.clone()
                    };
                    entry.end_time = Some(end);
                    closed.push(entry.id.clone());
                }
            }
        }

        if !closed.is_empty() {
            self.save_ledger(&ledger)?;
            for id in &closed {
                self.clear_markers_for(id);
            }
            info!(count = closed.len(), "Orphan sessions reconciled");
        }
        Ok(closed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn open_creates_entry() {
        let (_dir, store) = store();
        let id = store
            .open_session(Path::new("/work/project"), false, fixed_now())
            .unwrap();

        let ledger = store.load_ledger();
        assert_eq!(ledger.sessions.len(), 1);
        let entry = &ledger.sessions[0];
        assert_eq!(entry.id, id);
        assert!(entry.is_open());
        assert_eq!(entry.project_dir, "/work/project");
        assert!(!entry.forced);
        assert_eq!(entry.start(), Some(fixed_now()));
    }

    #[test]
    fn close_sets_end_time() {
        let (_dir, store) = store();
        let now = fixed_now();
        let id = store.open_session(Path::new("."), false, now).unwrap();
        let later = now + chrono::Duration::minutes(30);
        store.close_session(&id, later).unwrap();

        let ledger = store.load_ledger();
        assert_eq!(ledger.sessions[0].end(), Some(later));
        // Without an activity sentinel, last_activity falls back to end time
        assert_eq!(
            ledger.sessions[0].last_activity.as_deref(),
            Some(later.to_rfc3339().as_str())
        );
    }

    #[test]
    fn close_unknown_or_closed_session_is_noop() {
        let (_dir, store) = store();
        let now = fixed_now();
        store
            .close_session(&SessionId::new("nope1234"), now)
            .unwrap();
        assert!(store.load_ledger().sessions.is_empty());

        let id = store.open_session(Path::new("."), false, now).unwrap();
        store.close_session(&id, now).unwrap();
        let first_end = store.load_ledger().sessions[0].end_time.clone();
        // Second close must not overwrite the recorded end
        store
            .close_session(&id, now + chrono::Duration::hours(1))
            .unwrap();
        assert_eq!(store.load_ledger().sessions[0].end_time, first_end);
    }

    #[test]
    fn corrupt_ledger_is_empty() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("session-ledger.json"), "{not json").unwrap();
        assert!(store.load_ledger().sessions.is_empty());
    }

    #[test]
    fn reconcile_closes_stale_sessions_at_their_start() {
        let (_dir, store) = store();
        let now = fixed_now();
        let stale_start = now - chrono::Duration::hours(ORPHAN_THRESHOLD_HOURS + 1);
        let id = store.open_session(Path::new("."), false, stale_start).unwrap();

        let closed = store.reconcile_orphans(now).unwrap();
        assert_eq!(closed, 1);

        let ledger = store.load_ledger();
        let entry = ledger.sessions.iter().find(|s| s.id == id).unwrap();
        assert_eq!(entry.end_time.as_deref(), Some(entry.start_time.as_str()));
    }

    #[test]
    fn reconcile_leaves_fresh_sessions_open() {
        let (_dir, store) = store();
        let now = fixed_now();
        store
            .open_session(Path::new("."), false, now - chrono::Duration::hours(1))
            .unwrap();

        assert_eq!(store.reconcile_orphans(now).unwrap(), 0);
        assert!(store.load_ledger().sessions[0].is_open());
    }

    #[test]
    fn reconcile_closes_unparseable_starts() {
        let (_dir, store) = store();
        let now = fixed_now();
        let mut ledger = Ledger::default();
        ledger.sessions.push(LedgerEntry {
            id: SessionId::new("bad00001"),
            start_time: "not-a-timestamp".into(),
            end_time: None,
            project_dir: ".".into(),
            forced: false,
            last_activity: None,
        });
        std::fs::write(
            store.ledger_path(),
            serde_json::to_string_pretty(&ledger).unwrap(),
        )
        .unwrap();

        assert_eq!(store.reconcile_orphans(now).unwrap(), 1);
        let reloaded = store.load_ledger();
        assert_eq!(
            reloaded.sessions[0].end_time.as_deref(),
            Some("not-a-timestamp")
        );
    }

    #[test]
    fn parse_timestamp_handles_offsets_and_garbage() {
        let utc = parse_timestamp("2025-01-15T12:00:00+00:00").unwrap();
        let offset = parse_timestamp("2025-01-15T13:00:00+01:00").unwrap();
        assert_eq!(utc, offset);
        assert!(parse_timestamp("yesterday-ish").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
