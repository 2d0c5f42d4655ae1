use serde::{Serialize, Serializer};
use std::fmt;

use crate::utils::round2;

/// A summary figure, or the marker for a column with nothing to aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    Unavailable,
}

impl MetricValue {
    /// Round to 2 dp; non-finite inputs become `Unavailable`.
    pub fn rounded(value: f64) -> Self {
        if value.is_finite() {
            MetricValue::Value(round2(value))
        } else {
            MetricValue::Unavailable
        }
    }

    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(MetricValue::Unavailable, Self::rounded)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, MetricValue::Value(_))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Value(v) => write!(f, "{:.2}", v),
            MetricValue::Unavailable => f.write_str("N/A"),
        }
    }
}

// Serialised as a number or `null`.
impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(v) => serializer.serialize_f64(*v),
            MetricValue::Unavailable => serializer.serialize_none(),
        }
    }
}

/// Descriptive statistics for one weekday analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub average_open: MetricValue,
    pub average_close: MetricValue,
    pub average_variance: MetricValue,
    pub max_high: MetricValue,
    pub min_low: MetricValue,
    pub average_k: MetricValue,
    pub average_d: MetricValue,
    pub average_rsi: MetricValue,
}

impl SummaryStats {
    pub fn unavailable() -> Self {
        Self {
            average_open: MetricValue::Unavailable,
            average_close: MetricValue::Unavailable,
            average_variance: MetricValue::Unavailable,
            max_high: MetricValue::Unavailable,
            min_low: MetricValue::Unavailable,
            average_k: MetricValue::Unavailable,
            average_d: MetricValue::Unavailable,
            average_rsi: MetricValue::Unavailable,
        }
    }

    /// Display label and value, in presentation order.
    pub fn entries(&self) -> [(&'static str, MetricValue); 8] {
        [
            ("Average Open", self.average_open),
            ("Average Close", self.average_close),
            ("Average Variance", self.average_variance),
            ("Max High", self.max_high),
            ("Min Low", self.min_low),
            ("Average %K", self.average_k),
            ("Average %D", self.average_d),
            ("Average RSI", self.average_rsi),
        ]
    }
}
