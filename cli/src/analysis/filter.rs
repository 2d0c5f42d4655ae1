use chrono::Weekday;
use tracing::debug;

use crate::models::{FilteredRow, FilteredSeries, PriceSeries};

/// Keep the bars that fall on `weekday`, in their original order, each with
/// its high-low variance.
pub fn filter_by_weekday(series: &PriceSeries, weekday: Weekday) -> FilteredSeries {
    let rows: FilteredSeries = series
        .into_iter()
        .filter(|bar| bar.weekday() == weekday)
        .map(FilteredRow::from_bar)
        .collect();

    debug!(input_rows = series.len(), kept_rows = rows.len(), ?weekday, "Filtered series by weekday");
    rows
}

/// Every bar of the series with its variance, no filtering.
pub fn with_variance(series: &PriceSeries) -> FilteredSeries {
    series.into_iter().map(FilteredRow::from_bar).collect()
}
