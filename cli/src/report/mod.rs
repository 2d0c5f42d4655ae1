//! Presentation adapter: table rows, chart payloads and summary text.

pub mod chart;
pub mod table;
pub mod text;

pub use chart::{build_charts, ChartSet, GuideLine, LineChart, LineTrace, OhlcChart};
pub use table::{format_optional, render_text_table, table_rows, SortOrder, TableRow, COLUMNS};
pub use text::{heading, insights_markdown, summary_markdown, INSIGHTS_PARTIAL_NOTE};

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::{IndicatorBasis, WeekdayAnalysis};
use crate::models::SummaryStats;
use crate::utils::{format_date, weekday_name};

/// Everything the page needs to render one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct WeekdayReport {
    pub ticker: String,
    pub weekday: &'static str,
    pub start: String,
    pub end: String,
    pub basis: IndicatorBasis,
    pub heading: String,
    pub table: Vec<TableRow>,
    pub charts: ChartSet,
    pub summary: SummaryStats,
    pub summary_text: String,
}

pub fn build_report(
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    analysis: &WeekdayAnalysis,
    order: SortOrder,
) -> WeekdayReport {
    WeekdayReport {
        ticker: ticker.to_string(),
        weekday: weekday_name(analysis.weekday),
        start: format_date(start),
        end: format_date(end),
        basis: analysis.basis,
        heading: heading(ticker, analysis.weekday, start, end),
        table: table_rows(&analysis.rows, order),
        charts: build_charts(ticker, analysis),
        summary: analysis.summary,
        summary_text: summary_markdown(&analysis.summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisConfig};
    use crate::models::{PriceBar, PriceSeries};
    use chrono::{Datelike, Duration, Weekday};

    fn sample_analysis() -> WeekdayAnalysis {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..200)
            .map(|i| start + Duration::days(i))
            .filter(|d| d.weekday().num_days_from_monday() < 5)
            .enumerate()
            .map(|(i, date)| {
                let c = 150.0 + (i as f64 * 0.37).sin() * 12.0;
                PriceBar::new(date, c - 0.4, c + 1.8, c - 2.1, c, 10_000 + i as u64)
            })
            .collect();
        let series = PriceSeries::new(bars).unwrap();
        analyze(&series, Weekday::Fri, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_report_shapes() {
        let analysis = sample_analysis();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 7, 19).unwrap();
        let report = build_report("AAPL", start, end, &analysis, SortOrder::Descending);

        assert_eq!(report.weekday, "Friday");
        assert_eq!(report.table.len(), analysis.rows.len());
        assert_eq!(report.charts.ohlc.dates.len(), analysis.rows.len());
        assert_eq!(report.charts.stochastic.traces.len(), 2);
        assert_eq!(report.charts.rsi.guides[0].value, 70.0);
        assert_eq!(report.charts.stochastic.guides[1].value, 20.0);
        assert_eq!(report.charts.ohlc.title, "AAPL Stock OHLC Chart on Fridays");
        // charts stay chronological, the table is newest first
        assert!(report.charts.ohlc.dates.first() < report.charts.ohlc.dates.last());
        assert!(report.table.first().map(|r| &r.date) > report.table.last().map(|r| &r.date));
    }

    #[test]
    fn test_report_json_marks_missing_as_null() {
        let analysis = sample_analysis();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let report = build_report("AAPL", day, day, &analysis, SortOrder::Ascending);
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["table"][0]["%K"].is_null());
        assert!(json["charts"]["rsi"]["traces"][0]["values"][0].is_null());
        assert_eq!(json["basis"], "filtered");
        assert!(json["summary"]["average_close"].is_number());
    }
}
