//! Wall-clock time types for schedule evaluation
//!
//! Schedules are declared as times of day, independent of any date. This
//! module provides the minute-axis primitives the evaluator and the epoch
//! compiler share: `WallClock` (a time of day), `MinuteWindow` (a half-open
//! interval on the 24-hour minute axis, possibly wrapping midnight), and
//! `DaysOfWeek` (a weekday mask).
//!
//! # Mock Time for Development
//!
//! In debug builds, the `PACEKEEPER_MOCK_TIME` environment variable can be
//! set to override the clock snapshot taken at invocation start. Useful for
//! exercising a policy without waiting for the relevant time of day.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (interpreted as UTC), e.g.
//! `PACEKEEPER_MOCK_TIME="2025-06-15 23:45:00" pacekeeper check`

use chrono::{DateTime, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "PACEKEEPER_MOCK_TIME";

/// Minutes in a day; also the effective end minute of a window ending 00:00.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Seconds in a day, used for whole-day epoch shifts.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Cached mock time offset from the real time when the process started.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

fn mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive) => {
                        let mock_dt = naive.and_utc();
                        let offset = mock_dt.signed_duration_since(Utc::now());
                        tracing::info!(
                            mock_time = %mock,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Take the single clock snapshot for this invocation.
///
/// In release builds this is always the real system time. In debug builds a
/// `PACEKEEPER_MOCK_TIME` override is applied, advancing at the real rate.
/// Callers read the clock exactly once and pass the instant down; nothing in
/// the engine consults the clock again.
pub fn now_utc() -> DateTime<Utc> {
    let real_now = Utc::now();
    match mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// A time of day, to minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Parse `HH:MM`. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.trim().split_once(':')?;
        Self::new(h.parse().ok()?, m.parse().ok()?)
    }

    /// Minutes since midnight.
    pub fn minutes_from_midnight(&self) -> u32 {
        (self.hour as u32) * 60 + self.minute as u32
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.minutes_from_midnight()
            .cmp(&other.minutes_from_midnight())
    }
}

impl std::fmt::Display for WallClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A half-open interval [start, end) on the minute axis.
///
/// When `end < start` the window wraps midnight: membership becomes
/// `minute >= start OR minute < end`. An end of `MINUTES_PER_DAY` denotes
/// end-of-day (a window declared as ending 00:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteWindow {
    pub start: u32,
    pub end: u32,
}

impl MinuteWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Whether this window crosses midnight.
    pub fn is_wrapping(&self) -> bool {
        self.end < self.start
    }

    /// Wraparound-aware half-open membership test.
    pub fn contains(&self, minute: u32) -> bool {
        if self.start < self.end {
            minute >= self.start && minute < self.end
        } else {
            minute >= self.start || minute < self.end
        }
    }
}

/// Days of the week mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DaysOfWeek(u8);

impl DaysOfWeek {
    pub const MONDAY: u8 = 1 << 0;
    pub const TUESDAY: u8 = 1 << 1;
    pub const WEDNESDAY: u8 = 1 << 2;
    pub const THURSDAY: u8 = 1 << 3;
    pub const FRIDAY: u8 = 1 << 4;
    pub const SATURDAY: u8 = 1 << 5;
    pub const SUNDAY: u8 = 1 << 6;

    pub const WEEKDAYS: DaysOfWeek = DaysOfWeek(
        Self::MONDAY | Self::TUESDAY | Self::WEDNESDAY | Self::THURSDAY | Self::FRIDAY,
    );
    pub const WEEKENDS: DaysOfWeek = DaysOfWeek(Self::SATURDAY | Self::SUNDAY);
    pub const ALL_DAYS: DaysOfWeek = DaysOfWeek(0x7F);
    pub const NONE: DaysOfWeek = DaysOfWeek(0);

    pub fn new(mask: u8) -> Self {
        Self(mask & 0x7F)
    }

    /// Parse a single day name, full or three-letter, case-insensitive.
    pub fn parse_day(name: &str) -> Option<Self> {
        let bit = match name.trim().to_lowercase().as_str() {
            "mon" | "monday" => Self::MONDAY,
            "tue" | "tuesday" => Self::TUESDAY,
            "wed" | "wednesday" => Self::WEDNESDAY,
            "thu" | "thursday" => Self::THURSDAY,
            "fri" | "friday" => Self::FRIDAY,
            "sat" | "saturday" => Self::SATURDAY,
            "sun" | "sunday" => Self::SUNDAY,
            _ => return None,
        };
        Some(Self(bit))
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        let bit = match weekday {
            Weekday::Mon => Self::MONDAY,
            Weekday::Tue => Self::TUESDAY,
            Weekday::Wed => Self::WEDNESDAY,
            Weekday::Thu => Self::THURSDAY,
            Weekday::Fri => Self::FRIDAY,
            Weekday::Sat => Self::SATURDAY,
            Weekday::Sun => Self::SUNDAY,
        };
        (self.0 & bit) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for DaysOfWeek {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}
