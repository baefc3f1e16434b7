//! Validated policy structures
//!
//! A [`Policy`] is built from a scanned document and is either complete or
//! absent: a document that carries the framework marker but declares a
//! malformed schedule field yields no policy at all, never a partially
//! enforced one.

use crate::scan::Value;
use pacekeeper_util::{DaysOfWeek, WallClock};
use serde::{Deserialize, Serialize};

/// Marker a document must declare to be treated as a policy.
pub const FRAMEWORK_MARKER: &str = "pacekeeper";

/// Validated policy ready for evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// IANA timezone name; resolved with a silent UTC fallback
    pub timezone: String,

    /// Daily allowed-hours window
    pub allowed_hours: AllowedHours,

    /// Weekdays on which work is blocked outright
    pub blocked_days: DaysOfWeek,

    /// Named sub-periods inside the allowed window, in declaration order
    pub blocked_periods: Vec<BlockedPeriod>,

    /// Start of the wind-down tail of the allowed window
    pub wind_down: Option<WallClock>,

    /// Session and break limits
    pub limits: SessionLimits,

    /// How blocking outcomes are enforced
    pub enforcement: Enforcement,

    /// Operator-facing message templates, keyed by event kind
    pub messages: Messages,
}

/// The daily allowed-hours window. An end of 00:00 denotes end-of-day; an
/// end numerically before the start denotes a window wrapping midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllowedHours {
    pub start: WallClock,
    pub end: WallClock,
}

/// A named blocked sub-period, independently capable of wrapping midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockedPeriod {
    pub name: String,
    pub start: WallClock,
    pub end: WallClock,
}

/// Session and break limits, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_continuous_minutes: u32,
    pub min_break_minutes: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_continuous_minutes: 150,
            min_break_minutes: 15,
        }
    }
}

/// Enforcement mode for blocking outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    /// Blocks deny the check
    #[default]
    Soft,
    /// Blocks warn but allow
    Advisory,
}

/// Event kinds a message template can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    OutsideHours,
    BlockedDay,
    BlockedPeriod,
    WindDown,
    SessionLimit,
    BreakReminder,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::OutsideHours => "outside_hours",
            MessageKind::BlockedDay => "blocked_day",
            MessageKind::BlockedPeriod => "blocked_period",
            MessageKind::WindDown => "wind_down",
            MessageKind::SessionLimit => "session_limit",
            MessageKind::BreakReminder => "break_reminder",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-facing message templates. Missing entries are empty strings and
/// suppress the corresponding notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default)]
    pub outside_hours: String,
    #[serde(default)]
    pub blocked_day: String,
    #[serde(default)]
    pub blocked_period: String,
    #[serde(default)]
    pub wind_down: String,
    #[serde(default)]
    pub session_limit: String,
    #[serde(default)]
    pub break_reminder: String,
}

impl Messages {
    pub fn for_kind(&self, kind: MessageKind) -> &str {
        match kind {
            MessageKind::OutsideHours => &self.outside_hours,
            MessageKind::BlockedDay => &self.blocked_day,
            MessageKind::BlockedPeriod => &self.blocked_period,
            MessageKind::WindDown => &self.wind_down,
            MessageKind::SessionLimit => &self.session_limit,
            MessageKind::BreakReminder => &self.break_reminder,
        }
    }

    fn from_value(doc: &Value) -> Self {
        let read = |key: &str| -> String {
            doc.get("messages")
                .and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        Self {
            outside_hours: read("outside_hours"),
            blocked_day: read("blocked_day"),
            blocked_period: read("blocked_period"),
            wind_down: read("wind_down"),
            session_limit: read("session_limit"),
            break_reminder: read("break_reminder"),
        }
    }
}

impl Policy {
    /// Build a policy from a scanned document.
    ///
    /// Returns `None` unless the document carries the framework marker and a
    /// parseable allowed-hours window. A declared-but-malformed blocked
    /// period or wind-down time also yields `None`: a broken policy is
    /// absent, not partially enforced.
    pub fn from_value(doc: &Value) -> Option<Policy> {
        if doc.get("framework")?.as_str()? != FRAMEWORK_MARKER {
            return None;
        }

        let schedule = doc.get("schedule")?;
        let allowed = schedule.get("allowed_hours")?;
        let allowed_hours = AllowedHours {
            start: WallClock::parse(allowed.get("start")?.as_str()?)?,
            end: WallClock::parse(allowed.get("end")?.as_str()?)?,
        };

        let mut blocked_days = DaysOfWeek::NONE;
        if let Some(days) = schedule.get("blocked_days").and_then(Value::as_seq) {
            for day in days {
                // Unrecognized names can never match a real weekday; skip them
                if let Some(mask) = day.as_str().and_then(DaysOfWeek::parse_day) {
                    blocked_days = blocked_days | mask;
                }
            }
        }

        let mut blocked_periods = Vec::new();
        if let Some(periods) = schedule.get("blocked_periods").and_then(Value::as_seq) {
            for period in periods {
                blocked_periods.push(BlockedPeriod {
                    name: period
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    start: WallClock::parse(period.get("start")?.as_str()?)?,
                    end: WallClock::parse(period.get("end")?.as_str()?)?,
                });
            }
        }

        let wind_down = match schedule.get("wind_down") {
            None | Some(Value::Null) => None,
            Some(wd) if wd.entries().is_some_and(|e| e.is_empty()) => None,
            Some(wd) => Some(WallClock::parse(wd.get("start")?.as_str()?)?),
        };

        let sessions = doc.get("sessions");
        let limits = SessionLimits {
            max_continuous_minutes: read_minutes(sessions, "max_continuous_minutes", 150),
            min_break_minutes: read_minutes(sessions, "min_break_minutes", 15),
        };

        let enforcement = match doc.get("enforcement").and_then(Value::as_str) {
            Some("advisory") => Enforcement::Advisory,
            _ => Enforcement::Soft,
        };

        let timezone = doc
            .get("operator")
            .and_then(|o| o.get("timezone"))
            .and_then(Value::as_str)
            .unwrap_or("UTC")
            .to_string();

        Some(Policy {
            timezone,
            allowed_hours,
            blocked_days,
            blocked_periods,
            wind_down,
            limits,
            enforcement,
            messages: Messages::from_value(doc),
        })
    }

    /// Resolve the declared timezone, falling back to UTC when unrecognized.
    pub fn resolve_timezone(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::debug!(timezone = %self.timezone, "Unrecognized timezone, using UTC");
            chrono_tz::UTC
        })
    }
}

fn read_minutes(node: Option<&Value>, key: &str, default: u32) -> u32 {
    node.and_then(|n| n.get(key))
        .and_then(Value::as_int)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::parse_document;

    const SAMPLE_POLICY: &str = r#"
version: "1.1"
framework: pacekeeper

operator:
  name: "Robin"
  timezone: "Europe/London"

schedule:
  allowed_hours:
    start: "09:00"
    end: "00:00"
  blocked_days:
    - Sunday
  blocked_periods:
    - name: "family"
      start: "18:00"
      end: "21:00"
  wind_down:
    start: "23:30"

sessions:
  max_continuous_minutes: 150
  min_break_minutes: 15

enforcement: soft

messages:
  outside_hours: >
    Outside working hours.
  blocked_period: >
    This period is reserved.
  wind_down: >
    Start wrapping up.
"#;

    fn parse(text: &str) -> Option<Policy> {
        Policy::from_value(&parse_document(text))
    }

    #[test]
    fn sample_policy_parses() {
        let policy = parse(SAMPLE_POLICY).unwrap();
        assert_eq!(policy.timezone, "Europe/London");
        assert_eq!(policy.allowed_hours.start, WallClock::new(9, 0).unwrap());
        assert_eq!(policy.allowed_hours.end, WallClock::new(0, 0).unwrap());
        assert!(policy.blocked_days.contains(chrono::Weekday::Sun));
        assert!(!policy.blocked_days.contains(chrono::Weekday::Mon));
        assert_eq!(policy.blocked_periods.len(), 1);
        assert_eq!(policy.blocked_periods[0].name, "family");
        assert_eq!(policy.wind_down, WallClock::new(23, 30));
        assert_eq!(policy.limits.max_continuous_minutes, 150);
        assert_eq!(policy.limits.min_break_minutes, 15);
        assert_eq!(policy.enforcement, Enforcement::Soft);
        assert_eq!(policy.messages.outside_hours, "Outside working hours.");
        assert_eq!(policy.messages.session_limit, "");
    }

    #[test]
    fn missing_marker_is_absent() {
        let text = SAMPLE_POLICY.replace("framework: pacekeeper", "framework: other");
        assert!(parse(&text).is_none());
        assert!(parse("just: text").is_none());
    }

    #[test]
    fn missing_allowed_hours_is_absent() {
        let text = "framework: pacekeeper\nschedule:\n  wind_down:\n    start: \"23:30\"\n";
        assert!(parse(text).is_none());
    }

    #[test]
    fn malformed_period_makes_policy_absent() {
        let text = SAMPLE_POLICY.replace("start: \"18:00\"", "start: \"25:99\"");
        assert!(parse(&text).is_none());
    }

    #[test]
    fn empty_wind_down_is_no_wind_down() {
        let text = SAMPLE_POLICY.replace("  wind_down:\n    start: \"23:30\"\n", "");
        let policy = parse(&text).unwrap();
        assert_eq!(policy.wind_down, None);
    }

    #[test]
    fn limits_default_when_missing_or_invalid() {
        let text = "framework: pacekeeper\nschedule:\n  allowed_hours:\n    start: \"09:00\"\n    end: \"17:00\"\n";
        let policy = parse(text).unwrap();
        assert_eq!(policy.limits, SessionLimits::default());

        let text = format!("{text}sessions:\n  max_continuous_minutes: lots\n");
        let policy = parse(&text).unwrap();
        assert_eq!(policy.limits.max_continuous_minutes, 150);
    }

    #[test]
    fn advisory_enforcement_parses() {
        let text = SAMPLE_POLICY.replace("enforcement: soft", "enforcement: advisory");
        assert_eq!(parse(&text).unwrap().enforcement, Enforcement::Advisory);

        // Unknown modes degrade to soft
        let text = SAMPLE_POLICY.replace("enforcement: soft", "enforcement: strict");
        assert_eq!(parse(&text).unwrap().enforcement, Enforcement::Soft);
    }

    #[test]
    fn unknown_timezone_resolves_to_utc() {
        let text = SAMPLE_POLICY.replace("Europe/London", "Mars/OlympusMons");
        let policy = parse(&text).unwrap();
        assert_eq!(policy.resolve_timezone(), chrono_tz::UTC);
    }

    #[test]
    fn known_timezone_resolves() {
        let policy = parse(SAMPLE_POLICY).unwrap();
        assert_eq!(policy.resolve_timezone(), chrono_tz::Europe::London);
    }

    #[test]
    fn unrecognized_blocked_day_names_ignored() {
        let text = SAMPLE_POLICY.replace("- Sunday", "- Sunday\n    - Funday");
        let policy = parse(&text).unwrap();
        assert!(policy.blocked_days.contains(chrono::Weekday::Sun));
    }
}
