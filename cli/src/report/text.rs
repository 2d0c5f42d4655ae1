use chrono::{NaiveDate, Weekday};

use crate::models::{AnalystInsights, SummaryStats};
use crate::utils::{format_date, weekday_name};

pub const INSIGHTS_PARTIAL_NOTE: &str = "Analyst data may not be available for this ticker.";

/// `AAPL Performance on Fridays (2024-01-01 to 2024-12-31)`
pub fn heading(ticker: &str, weekday: Weekday, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{} Performance on {}s ({} to {})",
        ticker,
        weekday_name(weekday),
        format_date(start),
        format_date(end)
    )
}

/// Markdown bullet list of the summary figures.
pub fn summary_markdown(summary: &SummaryStats) -> String {
    summary
        .entries()
        .iter()
        .map(|(label, value)| format!("- {}: {}", label, value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn insights_markdown(insights: &AnalystInsights) -> String {
    let recommendation = insights.recommendation.as_deref().unwrap_or("N/A");
    let target = insights
        .target_mean_price
        .map_or_else(|| "N/A".to_string(), |p| format!("{:.2}", p));
    format!(
        "- Analyst Recommendation: {}\n- Mean Price Target: {}",
        recommendation, target
    )
}
