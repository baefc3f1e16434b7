//! Session-state snapshot
//!
//! A time-anchored projection of the policy for "today": every recurring
//! rule resolved to absolute epochs, plus the enforcement mode and message
//! templates. The snapshot is written on every successful check and consumed
//! by a much simpler periodic checker that compares epochs against "now" and
//! must not re-derive any timezone or wraparound logic.

use crate::{FileStore, StoreResult};
use pacekeeper_config::{Enforcement, Messages};
use pacekeeper_util::SessionId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Flat, timezone-agnostic session state. All times are Unix epochs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStateSnapshot {
    /// Fresh identifier for the session this snapshot anchors.
    pub session_id: SessionId,

    /// The instant the snapshot was computed for.
    pub start_epoch: i64,

    /// Session-limit deadline.
    pub max_epoch: i64,

    /// 80%-of-limit warning instant.
    pub warn_epoch: i64,

    /// Wind-down start; absent when the policy declares none. May already be
    /// in the past for a session opened inside the wind-down window.
    pub wind_down_epoch: Option<i64>,

    /// End of the allowed-hours window.
    pub end_allowed_epoch: i64,

    /// Blocked periods resolved to the day instance relevant right now.
    pub blocked_periods: Vec<BlockedPeriodEpochs>,

    pub enforcement: Enforcement,

    pub messages: Messages,
}

/// A blocked period projected onto absolute time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPeriodEpochs {
    pub name: String,
    pub start_epoch: i64,
    pub end_epoch: i64,
}

impl FileStore {
    /// Write the snapshot, superseding any previous one.
    pub fn write_snapshot(&self, snapshot: &SessionStateSnapshot) -> StoreResult<()> {
        if let Some(parent) = self.state_path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(
            self.state_path(),
            serde_json::to_string_pretty(snapshot)?,
        )?;
        debug!(path = %self.state_path().display(), "Session state written");
        Ok(())
    }

    /// Read the last written snapshot, if a valid one exists.
    pub fn read_snapshot(&self) -> Option<SessionStateSnapshot> {
        let text = std::fs::read_to_string(self.state_path()).ok()?;
        serde_json::from_str(&text).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionStateSnapshot {
        SessionStateSnapshot {
            session_id: SessionId::new("abcd1234"),
            start_epoch: 1_736_899_200,
            max_epoch: 1_736_908_200,
            warn_epoch: 1_736_906_400,
            wind_down_epoch: None,
            end_allowed_epoch: 1_736_942_400,
            blocked_periods: vec![BlockedPeriodEpochs {
                name: "family".into(),
                start_epoch: 1_736_920_800,
                end_epoch: 1_736_931_600,
            }],
            enforcement: Enforcement::Soft,
            messages: Messages::default(),
        }
    }

    #[test]
    fn snapshot_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(store.read_snapshot().is_none());
        store.write_snapshot(&sample()).unwrap();
        assert_eq!(store.read_snapshot(), Some(sample()));
    }

    #[test]
    fn snapshot_overwritten_by_next_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.write_snapshot(&sample()).unwrap();
        let mut second = sample();
        second.session_id = SessionId::new("ef567890");
        second.wind_down_epoch = Some(1_736_938_800);
        store.write_snapshot(&second).unwrap();

        assert_eq!(store.read_snapshot(), Some(second));
    }

    #[test]
    fn snapshot_serializes_enforcement_lowercase() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"enforcement\":\"soft\""));
        assert!(json.contains("\"wind_down_epoch\":null"));
    }
}
