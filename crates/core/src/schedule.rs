//! Sweep kinds and their UTC trigger calendar.
//!
//! | Sweep             | Fires at (UTC wall clock)      |
//! |-------------------|--------------------------------|
//! | `dayparting_sweep`| minute 0 of every hour         |
//! | `budget_sweep`    | every 5 minutes                |
//! | `daily_reset`     | 00:00 every day                |
//! | `monthly_reset`   | 00:00 on day 1                 |
//! | `spend_retention` | 03:00 every day                |
//!
//! Brand timezones do not shift these triggers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, DurationRound, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::retry::RetryPolicy;

/// How far back (hours) the scheduler looks for missed trigger minutes.
pub const MAX_CATCH_UP_HOURS: i64 = 24;

/// Hour (UTC) at which the retention cleanup runs.
const RETENTION_HOUR: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    #[serde(rename = "dayparting_sweep")]
    Dayparting,
    #[serde(rename = "budget_sweep")]
    Budget,
    DailyReset,
    MonthlyReset,
    SpendRetention,
}

impl SweepKind {
    pub const ALL: [SweepKind; 5] = [
        SweepKind::Dayparting,
        SweepKind::Budget,
        SweepKind::DailyReset,
        SweepKind::MonthlyReset,
        SweepKind::SpendRetention,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SweepKind::Dayparting => "dayparting_sweep",
            SweepKind::Budget => "budget_sweep",
            SweepKind::DailyReset => "daily_reset",
            SweepKind::MonthlyReset => "monthly_reset",
            SweepKind::SpendRetention => "spend_retention",
        }
    }

    /// Whether this sweep fires in the minute containing `at`.
    pub fn is_due(self, at: DateTime<Utc>) -> bool {
        let (minute, hour) = (at.minute(), at.hour());
        match self {
            SweepKind::Dayparting => minute == 0,
            SweepKind::Budget => minute % 5 == 0,
            SweepKind::DailyReset => hour == 0 && minute == 0,
            SweepKind::MonthlyReset => at.day() == 1 && hour == 0 && minute == 0,
            SweepKind::SpendRetention => hour == RETENTION_HOUR && minute == 0,
        }
    }

    pub fn retry_policy(self) -> RetryPolicy {
        match self {
            SweepKind::Dayparting | SweepKind::Budget => RetryPolicy::sweep(),
            SweepKind::DailyReset | SweepKind::MonthlyReset => RetryPolicy::budget_reset(),
            SweepKind::SpendRetention => RetryPolicy::retention(),
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown sweep kind: {s}")))
    }
}

/// Truncate an instant to the start of its minute.
pub fn minute_floor(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::minutes(1)).unwrap_or(at)
}

/// Sweeps due in any minute in `(last, now]`, each listed once, in
/// [`SweepKind::ALL`] order.
///
/// Sweeps are idempotent, so a backlog of missed minutes collapses into a
/// single run per kind. The look-back is capped at [`MAX_CATCH_UP_HOURS`].
pub fn due_between(last: DateTime<Utc>, now: DateTime<Utc>) -> Vec<SweepKind> {
    let end = minute_floor(now);
    let floor = end - Duration::hours(MAX_CATCH_UP_HOURS);
    let mut cursor = minute_floor(last).max(floor) + Duration::minutes(1);
    let mut due = Vec::new();

    while cursor <= end {
        for kind in SweepKind::ALL {
            if !due.contains(&kind) && kind.is_due(cursor) {
                due.push(kind);
            }
        }
        if due.len() == SweepKind::ALL.len() {
            break;
        }
        cursor += Duration::minutes(1);
    }

    due.sort_by_key(|k| SweepKind::ALL.iter().position(|a| a == k));
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // Calendar
    // -----------------------------------------------------------------------

    #[test]
    fn dayparting_fires_on_the_hour() {
        assert!(SweepKind::Dayparting.is_due(at(2024, 5, 7, 13, 0)));
        assert!(!SweepKind::Dayparting.is_due(at(2024, 5, 7, 13, 5)));
    }

    #[test]
    fn budget_fires_every_five_minutes() {
        assert!(SweepKind::Budget.is_due(at(2024, 5, 7, 13, 0)));
        assert!(SweepKind::Budget.is_due(at(2024, 5, 7, 13, 35)));
        assert!(!SweepKind::Budget.is_due(at(2024, 5, 7, 13, 36)));
    }

    #[test]
    fn resets_fire_at_utc_midnight() {
        assert!(SweepKind::DailyReset.is_due(at(2024, 5, 7, 0, 0)));
        assert!(!SweepKind::DailyReset.is_due(at(2024, 5, 7, 1, 0)));
        assert!(SweepKind::MonthlyReset.is_due(at(2024, 6, 1, 0, 0)));
        assert!(!SweepKind::MonthlyReset.is_due(at(2024, 6, 2, 0, 0)));
    }

    #[test]
    fn retention_fires_once_a_day() {
        assert!(SweepKind::SpendRetention.is_due(at(2024, 6, 2, 3, 0)));
        assert!(!SweepKind::SpendRetention.is_due(at(2024, 6, 2, 0, 0)));
    }

    #[test]
    fn names_round_trip() {
        for kind in SweepKind::ALL {
            assert_eq!(kind.as_str().parse::<SweepKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("nightly".parse::<SweepKind>().is_err());
    }

    // -----------------------------------------------------------------------
    // due_between
    // -----------------------------------------------------------------------

    #[test]
    fn no_minute_elapsed_means_nothing_due() {
        let t = at(2024, 6, 1, 0, 0);
        assert!(due_between(t, t + Duration::seconds(30)).is_empty());
    }

    #[test]
    fn first_of_month_midnight_fires_everything_but_retention() {
        let due = due_between(at(2024, 5, 31, 23, 59), at(2024, 6, 1, 0, 0));
        assert_eq!(
            due,
            vec![
                SweepKind::Dayparting,
                SweepKind::Budget,
                SweepKind::DailyReset,
                SweepKind::MonthlyReset,
            ]
        );
    }

    #[test]
    fn late_tick_catches_up_without_duplicates() {
        // Scheduler stalled from 12:58 to 13:11: one hourly and several
        // five-minute slots were missed; each kind is reported once.
        let due = due_between(at(2024, 6, 2, 12, 58), at(2024, 6, 2, 13, 11));
        assert_eq!(due, vec![SweepKind::Dayparting, SweepKind::Budget]);
    }

    #[test]
    fn the_last_minute_is_not_fired_twice() {
        let last = at(2024, 6, 2, 13, 0);
        assert!(due_between(last, at(2024, 6, 2, 13, 4)).is_empty());
    }

    #[test]
    fn catch_up_is_bounded() {
        let due = due_between(at(2020, 1, 1, 0, 0), at(2024, 6, 2, 12, 0));
        // A monthly reset from years ago is not replayed.
        assert!(!due.contains(&SweepKind::MonthlyReset));
        assert!(due.contains(&SweepKind::DailyReset));
    }
}
