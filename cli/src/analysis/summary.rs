use crate::models::{IndicatorRow, MetricValue, SummaryStats};
use crate::utils::{mean_present, round2};

/// Reduce annotated rows to the summary figures.
///
/// Every cell is rounded to 2 dp before aggregating, so the figures agree with
/// the rounded table, and each result is rounded again. Indicator means skip
/// missing values; a column with no value at all is reported as unavailable.
pub fn summarize(rows: &[IndicatorRow]) -> SummaryStats {
    let mean_of = |field: fn(&IndicatorRow) -> Option<f64>| {
        MetricValue::from_option(mean_present(rows.iter().map(|r| field(r).map(round2))))
    };

    SummaryStats {
        average_open: mean_of(|r| Some(r.bar().open)),
        average_close: mean_of(|r| Some(r.bar().close)),
        average_variance: mean_of(|r| Some(r.row.variance)),
        max_high: MetricValue::from_option(extreme(rows.iter().map(|r| r.bar().high), f64::max)),
        min_low: MetricValue::from_option(extreme(rows.iter().map(|r| r.bar().low), f64::min)),
        average_k: mean_of(|r| r.k),
        average_d: mean_of(|r| r.d),
        average_rsi: mean_of(|r| r.rsi),
    }
}

fn extreme<I>(values: I, pick: fn(f64, f64) -> f64) -> Option<f64>
where
    I: Iterator<Item = f64>,
{
    values.filter(|v| v.is_finite()).map(round2).reduce(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilteredRow, PriceBar};
    use chrono::NaiveDate;

    fn row(day: u32, open: f64, high: f64, low: f64, close: f64, k: Option<f64>) -> IndicatorRow {
        let bar = PriceBar::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), open, high, low, close, 10);
        IndicatorRow {
            row: FilteredRow::from_bar(&bar),
            k,
            d: None,
            rsi: None,
        }
    }

    #[test]
    fn test_summary_values() {
        let rows = vec![
            row(5, 10.0, 12.0, 9.0, 11.0, Some(40.0)),
            row(12, 11.0, 13.5, 10.0, 12.0, None),
            row(19, 12.333, 14.0, 8.5, 13.0, Some(61.118)),
        ];
        let summary = summarize(&rows);
        assert_eq!(summary.average_open, MetricValue::Value(11.11));
        assert_eq!(summary.average_close, MetricValue::Value(12.0));
        // variances 3.0, 3.5, 5.5
        assert_eq!(summary.average_variance, MetricValue::Value(4.0));
        assert_eq!(summary.max_high, MetricValue::Value(14.0));
        assert_eq!(summary.min_low, MetricValue::Value(8.5));
        assert_eq!(summary.average_k, MetricValue::Value(50.56));
    }

    #[test]
    fn test_means_use_table_rounded_cells() {
        let rows = vec![
            row(5, 100.004, 101.0, 99.0, 100.0, None),
            row(12, 100.004, 101.0, 99.0, 100.0, None),
            row(19, 100.004, 101.0, 99.0, 100.0, None),
            row(26, 100.012, 101.236, 98.994, 100.0, None),
        ];
        let summary = summarize(&rows);
        // cells round to 100.00 x3 and 100.01; unrounded they would average 100.006
        assert_eq!(summary.average_open, MetricValue::Value(100.0));
        assert_eq!(summary.max_high, MetricValue::Value(101.24));
        assert_eq!(summary.min_low, MetricValue::Value(98.99));
    }

    #[test]
    fn test_all_missing_column_is_unavailable() {
        let rows = vec![row(5, 1.0, 2.0, 0.5, 1.5, None), row(12, 1.0, 2.0, 0.5, 1.5, None)];
        let summary = summarize(&rows);
        assert_eq!(summary.average_k, MetricValue::Unavailable);
        assert_eq!(summary.average_d, MetricValue::Unavailable);
        assert_eq!(summary.average_rsi, MetricValue::Unavailable);
        assert!(summary.average_open.is_available());
    }

    #[test]
    fn test_empty_rows_are_all_unavailable() {
        assert_eq!(summarize(&[]), SummaryStats::unavailable());
    }
}
