use chrono::{NaiveDate, Weekday};
use thiserror::Error;

use crate::utils::weekday_name;

/// Errors surfaced by the analysis pipeline and its input helpers.
///
/// Missing indicator values are not errors: they travel as `None` through
/// the rows and summary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TracerError {
    #[error("No data found for the provided ticker or date range. Please check the ticker symbol or adjust the dates.")]
    EmptyInput,

    #[error("No data available on {}s in the selected date range.", day_name(.weekday))]
    EmptyFilterResult { weekday: Weekday },

    #[error("{name} period must be between 1 and 10000, got {value}")]
    InvalidPeriod { name: &'static str, value: usize },

    #[error("price series must be strictly increasing by date (offending date {date})")]
    UnorderedSeries { date: NaiveDate },

    #[error("invalid weekday '{0}'")]
    InvalidWeekday(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

fn day_name(weekday: &Weekday) -> &'static str {
    weekday_name(*weekday)
}

pub type Result<T> = std::result::Result<T, TracerError>;
