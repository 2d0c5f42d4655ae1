use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use super::filter::{filter_by_weekday, with_variance};
use super::indicators::{annotate, IndicatorConfig};
use super::summary::summarize;
use crate::error::{Result, TracerError};
use crate::models::{IndicatorRow, PriceSeries, SummaryStats};
use crate::utils::Timer;

/// Which rows the indicator windows advance over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorBasis {
    /// Only the rows on the requested weekday: a 14-period RSI spans 14 of
    /// those weekdays.
    #[default]
    Filtered,
    /// Every daily bar; the weekday filter is applied afterwards.
    Daily,
}

impl IndicatorBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorBasis::Filtered => "filtered",
            IndicatorBasis::Daily => "daily",
        }
    }
}

impl fmt::Display for IndicatorBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorBasis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filtered" | "weekday" => Ok(IndicatorBasis::Filtered),
            "daily" | "raw" => Ok(IndicatorBasis::Daily),
            other => Err(format!("unknown indicator basis '{}', expected 'filtered' or 'daily'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub basis: IndicatorBasis,
}

/// Result of one weekday analysis, rows oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayAnalysis {
    pub weekday: Weekday,
    pub basis: IndicatorBasis,
    pub rows: Vec<IndicatorRow>,
    pub summary: SummaryStats,
}

/// Filter `series` to `weekday`, attach indicators and summarise.
///
/// Fails with [`TracerError::EmptyInput`] for an empty series and with
/// [`TracerError::EmptyFilterResult`] when no bar falls on `weekday`.
pub fn analyze(series: &PriceSeries, weekday: Weekday, config: &AnalysisConfig) -> Result<WeekdayAnalysis> {
    config.indicators.validate()?;

    if series.is_empty() {
        return Err(TracerError::EmptyInput);
    }

    let timer = Timer::start("weekday analysis");

    let rows = match config.basis {
        IndicatorBasis::Filtered => {
            let filtered = filter_by_weekday(series, weekday);
            if filtered.is_empty() {
                return Err(TracerError::EmptyFilterResult { weekday });
            }
            annotate(filtered, &config.indicators)
        }
        IndicatorBasis::Daily => {
            let rows: Vec<IndicatorRow> = annotate(with_variance(series), &config.indicators)
                .into_iter()
                .filter(|row| row.bar().weekday() == weekday)
                .collect();
            if rows.is_empty() {
                return Err(TracerError::EmptyFilterResult { weekday });
            }
            rows
        }
    };

    let summary = summarize(&rows);
    debug!(?summary, "Computed summary statistics");

    info!(
        input_rows = series.len(),
        weekday_rows = rows.len(),
        basis = %config.basis,
        elapsed_ms = timer.elapsed_ms(),
        "Weekday analysis complete"
    );
    timer.log_elapsed();

    Ok(WeekdayAnalysis {
        weekday,
        basis: config.basis,
        rows,
        summary,
    })
}
