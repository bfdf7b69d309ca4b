//! Dayparting evaluator.
//!
//! Pure logic, no database access. The caller loads a campaign's schedule
//! rows, converts the current instant into the brand's timezone with
//! [`local_time`], and asks [`is_within_window`].

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;

/// Highest valid hour value (inclusive).
pub const MAX_HOUR: i16 = 23;

/// Highest valid day-of-week value (0 = Monday, 6 = Sunday).
pub const MAX_DAY_OF_WEEK: i16 = 6;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One allowed window: `start_hour..=end_hour` on `day_of_week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub day_of_week: i16,
    pub start_hour: i16,
    pub end_hour: i16,
    pub is_active: bool,
}

impl ScheduleWindow {
    fn covers_hour(&self, hour: i16) -> bool {
        self.start_hour <= hour && hour <= self.end_hour
    }
}

/// Whether `local` falls inside any active window for its weekday.
///
/// Fail-closed: with no active window for the day the answer is `false`.
/// Bounds are inclusive at hour granularity, so a window ending at 22
/// still admits 22:59.
pub fn is_within_window<T>(schedules: &[ScheduleWindow], local: &T) -> bool
where
    T: Datelike + Timelike,
{
    let day = local.weekday().num_days_from_monday() as i16;
    let hour = local.hour() as i16;

    schedules
        .iter()
        .filter(|s| s.is_active && s.day_of_week == day)
        .any(|s| s.covers_hour(hour))
}

/// Parse an IANA timezone id such as `"Asia/Karachi"`.
pub fn parse_timezone(name: &str) -> Result<Tz, CoreError> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::Validation(format!("Unknown timezone: {name}")))
}

/// Convert a UTC instant into the given zone.
pub fn local_time(utc: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    utc.with_timezone(&tz)
}

/// Validate the fields of a schedule row.
pub fn validate_window(day_of_week: i16, start_hour: i16, end_hour: i16) -> Result<(), CoreError> {
    if !(0..=MAX_DAY_OF_WEEK).contains(&day_of_week) {
        return Err(CoreError::Validation(format!(
            "day_of_week must be between 0 and {MAX_DAY_OF_WEEK}, got {day_of_week}"
        )));
    }
    for (field, value) in [("start_hour", start_hour), ("end_hour", end_hour)] {
        if !(0..=MAX_HOUR).contains(&value) {
            return Err(CoreError::Validation(format!(
                "{field} must be between 0 and {MAX_HOUR}, got {value}"
            )));
        }
    }
    if start_hour > end_hour {
        return Err(CoreError::Validation(
            "Start hour must be less than or equal to end hour".to_string(),
        ));
    }
    Ok(())
}

/// English day name for a 0-based (Monday-first) day index.
pub fn day_name(day_of_week: i16) -> &'static str {
    usize::try_from(day_of_week)
        .ok()
        .and_then(|i| DAY_NAMES.get(i).copied())
        .unwrap_or("Unknown")
}
