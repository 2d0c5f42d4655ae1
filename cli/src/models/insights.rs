use serde::{Deserialize, Serialize};

use crate::utils::round2;

/// Analyst consensus for a ticker. Either field may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalystInsights {
    pub recommendation: Option<String>,
    pub target_mean_price: Option<f64>,
}

impl AnalystInsights {
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Normalise provider values: `"strong_buy"` becomes `"Strong_buy"`, the
    /// target is rounded to 2 dp and non-finite targets are dropped.
    pub fn new(recommendation: Option<&str>, target_mean_price: Option<f64>) -> Self {
        Self {
            recommendation: recommendation
                .map(str::trim)
                .filter(|r| !r.is_empty() && !r.eq_ignore_ascii_case("none"))
                .map(capitalize),
            target_mean_price: target_mean_price.filter(|p| p.is_finite()).map(round2),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.recommendation.is_some() && self.target_mean_price.is_some()
    }
}

fn capitalize(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
