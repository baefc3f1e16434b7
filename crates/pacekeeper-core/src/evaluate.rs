//! Schedule evaluation
//!
//! A pure function from (policy, instant) to a status. All wall-clock
//! arithmetic happens in the policy's timezone, never the host's; an
//! unrecognized timezone falls back to UTC rather than failing the check.
//!
//! Precedence when several rules apply at once: blocked day, then outside
//! allowed hours, then blocked period (declaration order, first match wins),
//! then wind-down, then ok. The order is fixed so contradictory
//! configurations still resolve deterministically to the most restrictive
//! applicable status.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use pacekeeper_config::Policy;
use pacekeeper_util::{MINUTES_PER_DAY, MinuteWindow};

/// Why work is blocked right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    OutsideHours,
    BlockedDay,
    BlockedPeriod { name: String },
}

/// Result of evaluating the schedule at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Work may proceed.
    Ok,
    /// Work may proceed, but the allowed window is about to close.
    WindDown,
    /// Work is blocked.
    Blocked(BlockReason),
}

/// Evaluate the schedule in the policy's own timezone.
pub fn evaluate(policy: &Policy, now: DateTime<Utc>) -> Evaluation {
    evaluate_in(policy, now, policy.resolve_timezone())
}

/// Evaluate the schedule with an explicit timezone override.
pub fn evaluate_in(policy: &Policy, now: DateTime<Utc>, tz: Tz) -> Evaluation {
    let local = now.with_timezone(&tz);

    if policy.blocked_days.contains(local.weekday()) {
        return Evaluation::Blocked(BlockReason::BlockedDay);
    }

    let now_min = local.hour() * 60 + local.minute();
    let start = policy.allowed_hours.start.minutes_from_midnight();
    let mut end = policy.allowed_hours.end.minutes_from_midnight();
    if end == 0 {
        // An end of 00:00 denotes the day boundary, not "start of today"
        end = MINUTES_PER_DAY;
    }
    let allowed = MinuteWindow::new(start, end);
    if !allowed.contains(now_min) {
        return Evaluation::Blocked(BlockReason::OutsideHours);
    }

    for period in &policy.blocked_periods {
        let window = MinuteWindow::new(
            period.start.minutes_from_midnight(),
            period.end.minutes_from_midnight(),
        );
        if window.contains(now_min) {
            return Evaluation::Blocked(BlockReason::BlockedPeriod {
                name: period.name.clone(),
            });
        }
    }

    if let Some(wind_down) = policy.wind_down {
        // Runs up to the effective window end, wrap-aware like everything else
        let window = MinuteWindow::new(wind_down.minutes_from_midnight(), allowed.end);
        if window.contains(now_min) {
            return Evaluation::WindDown;
        }
    }

    Evaluation::Ok
}
