//! Break enforcement
//!
//! Derives "is the operator currently owed a break" from the session ledger.
//! The ledger is shared by every terminal on the machine, so the computation
//! has to distinguish "another terminal is actively working" (no break to
//! demand from this one) from "a session was abandoned hours ago" (enforce
//! normally). Malformed entries are data, not errors: they are skipped and
//! the computation proceeds.

use chrono::{DateTime, Utc};
use pacekeeper_store::{Ledger, ORPHAN_THRESHOLD_HOURS};

/// Outcome of the break computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakStatus {
    /// No break owed; work may proceed.
    Ready,
    /// A break is still due; wait this many whole minutes.
    Owed { minutes_left: i64 },
}

/// Decide whether enough break time has passed since the last real session.
///
/// Entries are scanned newest to oldest. A still-open entry younger than the
/// staleness threshold suppresses enforcement entirely; older open entries
/// count as closed-at-start (zero duration, hence trivial). Closed entries
/// shorter than `min_break_minutes` are trivial and establish no rest
/// boundary. The first qualifying entry's end timestamp is the most recent
/// rest boundary; with no qualifying entry there is nothing to rest from.
pub fn check_break(ledger: &Ledger, min_break_minutes: u32, now: DateTime<Utc>) -> BreakStatus {
    let stale = chrono::Duration::hours(ORPHAN_THRESHOLD_HOURS);

    for entry in &ledger.sessions {
        if entry.is_open() {
            if let Some(start) = entry.start() {
                let age = now.signed_duration_since(start);
                // Future-dated entries (clock skew) are not "active"
                if age >= chrono::Duration::zero() && age < stale {
                    return BreakStatus::Ready;
                }
            }
        }
    }

    let min_break = chrono::Duration::minutes(min_break_minutes as i64);

    for entry in ledger.sessions.iter().rev() {
        if entry.is_open() {
            continue;
        }
        let (Some(start), Some(end)) = (entry.start(), entry.end()) else {
            continue;
        };
        if end.signed_duration_since(start) < min_break {
            continue;
        }

        let elapsed = now.signed_duration_since(end);
        if elapsed >= min_break {
            return BreakStatus::Ready;
        }
        return BreakStatus::Owed {
            minutes_left: (min_break - elapsed).num_minutes(),
        };
    }

    BreakStatus::Ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pacekeeper_store::LedgerEntry;
    use pacekeeper_util::SessionId;

    const MIN_BREAK: u32 = 15;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    fn minutes_ago(m: i64) -> DateTime<Utc> {
        now() - chrono::Duration::minutes(m)
    }

    fn closed(start_min_ago: i64, end_min_ago: i64) -> LedgerEntry {
        LedgerEntry {
            id: SessionId::generate(),
            start_time: minutes_ago(start_min_ago).to_rfc3339(),
            end_time: Some(minutes_ago(end_min_ago).to_rfc3339()),
            project_dir: ".".into(),
            forced: false,
            last_activity: None,
        }
    }

    fn open(start_min_ago: i64) -> LedgerEntry {
        LedgerEntry {
            id: SessionId::generate(),
            start_time: minutes_ago(start_min_ago).to_rfc3339(),
            end_time: None,
            project_dir: "/elsewhere".into(),
            forced: false,
            last_activity: None,
        }
    }

    fn ledger(sessions: Vec<LedgerEntry>) -> Ledger {
        Ledger { sessions }
    }

    #[test]
    fn empty_ledger_is_ready() {
        assert_eq!(
            check_break(&Ledger::default(), MIN_BREAK, now()),
            BreakStatus::Ready
        );
    }

    #[test]
    fn recent_session_owes_a_break() {
        // 30-minute session ended 5 minutes ago
        let l = ledger(vec![closed(35, 5)]);
        assert_eq!(
            check_break(&l, MIN_BREAK, now()),
            BreakStatus::Owed { minutes_left: 10 }
        );
    }

    #[test]
    fn exact_threshold_satisfies_the_break() {
        let l = ledger(vec![closed(45, 15)]);
        assert_eq!(check_break(&l, MIN_BREAK, now()), BreakStatus::Ready);
    }

    #[test]
    fn one_minute_short_reports_one_minute() {
        let l = ledger(vec![closed(44, 14)]);
        assert_eq!(
            check_break(&l, MIN_BREAK, now()),
            BreakStatus::Owed { minutes_left: 1 }
        );
    }

    #[test]
    fn trivial_session_establishes_no_boundary() {
        // A 5-minute open/close just now must not reset the rest clock; the
        // qualifying session before it ended 60 minutes ago
        let l = ledger(vec![closed(90, 60), closed(6, 1)]);
        assert_eq!(check_break(&l, MIN_BREAK, now()), BreakStatus::Ready);

        // And a trivial session alone demands nothing
        let l = ledger(vec![closed(6, 1)]);
        assert_eq!(check_break(&l, MIN_BREAK, now()), BreakStatus::Ready);
    }

    #[test]
    fn trivial_session_does_not_satisfy_break_either() {
        // Long session ended 5 minutes ago; trivial blip after it
        let l = ledger(vec![closed(35, 5), closed(3, 2)]);
        assert_eq!(
            check_break(&l, MIN_BREAK, now()),
            BreakStatus::Owed { minutes_left: 10 }
        );
    }

    #[test]
    fn fresh_open_session_suppresses_enforcement() {
        // Another terminal is working: no break demanded here
        let l = ledger(vec![closed(35, 5), open(20)]);
        assert_eq!(check_break(&l, MIN_BREAK, now()), BreakStatus::Ready);
    }

    #[test]
    fn stale_open_session_does_not_suppress() {
        let stale_minutes = (ORPHAN_THRESHOLD_HOURS + 1) * 60;
        let l = ledger(vec![open(stale_minutes), closed(35, 5)]);
        assert_eq!(
            check_break(&l, MIN_BREAK, now()),
            BreakStatus::Owed { minutes_left: 10 }
        );
    }

    #[test]
    fn future_dated_open_session_does_not_suppress() {
        let l = ledger(vec![open(-60), closed(35, 5)]);
        assert_eq!(
            check_break(&l, MIN_BREAK, now()),
            BreakStatus::Owed { minutes_left: 10 }
        );
    }

    #[test]
    fn malformed_timestamps_are_skipped_not_fatal() {
        let mut bad_open = open(10);
        bad_open.start_time = "not-a-time".into();
        let mut bad_closed = closed(35, 5);
        bad_closed.end_time = Some("garbage".into());

        // The only readable qualifying entry ended 20 minutes ago
        let l = ledger(vec![closed(50, 20), bad_closed, bad_open]);
        assert_eq!(check_break(&l, MIN_BREAK, now()), BreakStatus::Ready);
    }

    #[test]
    fn newest_qualifying_entry_wins() {
        // An old long break satisfied; the newest qualifying session ended
        // 2 minutes ago and is the boundary that counts
        let l = ledger(vec![closed(300, 240), closed(32, 2)]);
        assert_eq!(
            check_break(&l, MIN_BREAK, now()),
            BreakStatus::Owed { minutes_left: 13 }
        );
    }
}
