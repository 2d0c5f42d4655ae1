use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PriceBar;

/// A bar kept by the weekday filter, with its high-low spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredRow {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub variance: f64,
}

impl FilteredRow {
    pub fn from_bar(bar: &PriceBar) -> Self {
        Self {
            bar: bar.clone(),
            variance: bar.variance(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }
}

/// Rows of a single weekday, oldest first.
pub type FilteredSeries = Vec<FilteredRow>;

/// A filtered row with its indicator values. `None` marks a value that could
/// not be computed (window warm-up or a zero range).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub row: FilteredRow,
    #[serde(rename = "%K")]
    pub k: Option<f64>,
    #[serde(rename = "%D")]
    pub d: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
}

impl IndicatorRow {
    pub fn date(&self) -> NaiveDate {
        self.row.bar.date
    }

    pub fn bar(&self) -> &PriceBar {
        &self.row.bar
    }
}
