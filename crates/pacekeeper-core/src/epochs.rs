//! Epoch compilation
//!
//! Projects the evaluator's recurring daily rules onto absolute timestamps
//! anchored to "today" in the policy's timezone. The output snapshot is
//! consumed by a stateless mid-session checker that can only compare epochs
//! and must never re-derive timezone or wraparound logic itself.
//!
//! Day anchoring is the subtle part: an overnight window straddles two
//! calendar days, so "the end of the window" or "tonight's wind-down" may
//! belong to yesterday or tomorrow depending on which side of midnight the
//! instant falls. Offsets are computed per date, so the projection stays
//! correct across daylight-saving transitions.

use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use pacekeeper_config::Policy;
use pacekeeper_store::{BlockedPeriodEpochs, SessionStateSnapshot};
use pacekeeper_util::{SECONDS_PER_DAY, SessionId, WallClock};

/// Resolve a wall-clock time on a given calendar date in `tz` to an epoch.
fn epoch_at(tz: Tz, date: NaiveDate, at: WallClock) -> i64 {
    // Valid by WallClock's construction invariant
    let naive = date
        .and_hms_opt(at.hour as u32, at.minute as u32, 0)
        .unwrap();
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.timestamp(),
        // Fall-back transition: the wall-clock time exists twice; take the earlier
        LocalResult::Ambiguous(first, _) => first.timestamp(),
        // Spring-forward gap: the wall-clock time does not exist; slide an hour
        LocalResult::None => match tz.from_local_datetime(&(naive + chrono::Duration::hours(1))) {
            LocalResult::Single(dt) => dt.timestamp(),
            LocalResult::Ambiguous(first, _) => first.timestamp(),
            LocalResult::None => Utc.from_utc_datetime(&naive).timestamp(),
        },
    }
}

/// Compile the session-state snapshot for `now`.
pub fn compile_snapshot(policy: &Policy, now: DateTime<Utc>) -> SessionStateSnapshot {
    let tz = policy.resolve_timezone();
    let local = now.with_timezone(&tz);
    let today = local.date_naive();
    let now_epoch = now.timestamp();
    let now_minutes = local.hour() * 60 + local.minute();

    let max_secs = policy.limits.max_continuous_minutes as i64 * 60;
    let max_epoch = now_epoch + max_secs;
    // Warn at 80% of the session limit
    let warn_epoch = now_epoch + max_secs * 4 / 5;

    let start_minutes = policy.allowed_hours.start.minutes_from_midnight();
    let end_minutes = policy.allowed_hours.end.minutes_from_midnight();

    let wind_down_epoch = policy.wind_down.map(|wd| {
        let mut epoch = epoch_at(tz, today, wd);
        if end_minutes != 0 && end_minutes < start_minutes {
            // Overnight window: pick the instance on the right side of midnight
            let wd_minutes = wd.minutes_from_midnight();
            if wd_minutes >= start_minutes {
                // Evening side; if we are already past midnight it happened yesterday
                if now_minutes < end_minutes {
                    epoch -= SECONDS_PER_DAY;
                }
            } else {
                // Morning side; if we are still on the evening side it is tomorrow's
                if now_minutes >= start_minutes {
                    epoch += SECONDS_PER_DAY;
                }
            }
        }
        epoch
    });

    let end_allowed_epoch = if end_minutes == 0 {
        // 00:00 denotes the day boundary: tomorrow's midnight
        epoch_at(tz, today, WallClock::new(0, 0).unwrap()) + SECONDS_PER_DAY
    } else {
        let mut epoch = epoch_at(tz, today, policy.allowed_hours.end);
        // Overnight window: an end not strictly ahead of us is tomorrow's
        if end_minutes < start_minutes && epoch <= now_epoch {
            epoch += SECONDS_PER_DAY;
        }
        epoch
    };

    let blocked_periods = policy
        .blocked_periods
        .iter()
        .map(|period| {
            let mut start_epoch = epoch_at(tz, today, period.start);
            let mut end_epoch = epoch_at(tz, today, period.end);
            if end_epoch <= start_epoch {
                end_epoch += SECONDS_PER_DAY;
            }
            // A session opened inside yesterday's instance of an overnight
            // period must test against that instance, not the upcoming one
            if start_epoch > now_epoch
                && now_epoch >= start_epoch - SECONDS_PER_DAY
                && now_epoch < end_epoch - SECONDS_PER_DAY
            {
                start_epoch -= SECONDS_PER_DAY;
                end_epoch -= SECONDS_PER_DAY;
            }
            BlockedPeriodEpochs {
                name: period.name.clone(),
                start_epoch,
                end_epoch,
            }
        })
        .collect();

    SessionStateSnapshot {
        session_id: SessionId::generate(),
        start_epoch: now_epoch,
        max_epoch,
        warn_epoch,
        wind_down_epoch,
        end_allowed_epoch,
        blocked_periods,
        enforcement: policy.enforcement,
        messages: policy.messages.clone(),
    }
}
