use chrono::{Duration, NaiveDate, Utc, Weekday};

use crate::error::{Result, TracerError};

/// Earliest start date the date pickers accept (2000-01-01).
pub fn earliest_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Default lookback from the end date.
pub const DEFAULT_LOOKBACK_WEEKS: i64 = 52;

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| TracerError::InvalidDate(date_str.to_string()))
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Upper bound for a configured lookback.
pub const MAX_LOOKBACK_WEEKS: i64 = 52 * 100;

/// `(end - lookback_weeks, end)`. A lookback past the calendar's range
/// saturates at `NaiveDate::MIN`.
pub fn default_date_range(end: NaiveDate, lookback_weeks: i64) -> (NaiveDate, NaiveDate) {
    let start = Duration::try_weeks(lookback_weeks)
        .and_then(|lookback| end.checked_sub_signed(lookback))
        .unwrap_or(NaiveDate::MIN);
    (start, end)
}

/// Accepts full names, three-letter abbreviations and 0-6 (Monday = 0),
/// case-insensitively.
pub fn parse_weekday(input: &str) -> Result<Weekday> {
    let trimmed = input.trim();
    if let Ok(index) = trimmed.parse::<u8>() {
        return weekday_from_index(index).ok_or_else(|| TracerError::InvalidWeekday(input.to_string()));
    }
    trimmed
        .parse::<Weekday>()
        .map_err(|_| TracerError::InvalidWeekday(input.to_string()))
}

fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Full English name, e.g. `Friday`.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
