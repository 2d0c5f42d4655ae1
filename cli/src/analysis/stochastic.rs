//! Stochastic Oscillator (%K / %D).
//!
//! `%K[i] = 100 * (close[i] - L[i]) / (H[i] - L[i])` where `L` and `H` are the
//! lowest low and highest high over the trailing `period` rows, and `%D` is the
//! simple moving average of `%K` over `smoothing` rows.

use super::rolling::{present, rolling_max, rolling_mean, rolling_min};

pub const DEFAULT_STOCHASTIC_PERIOD: usize = 14;
pub const DEFAULT_SMOOTHING_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticValues {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Compute %K and %D. The three slices must have equal length; the output
/// follows the shortest one.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    smoothing: usize,
) -> StochasticValues {
    let lowest = rolling_min(&present(lows), period);
    let highest = rolling_max(&present(highs), period);

    let k: Vec<Option<f64>> = closes
        .iter()
        .zip(lowest.iter().zip(&highest))
        .map(|(&close, (&low, &high))| percent_k(close, low?, high?))
        .collect();
    let d = rolling_mean(&k, smoothing);

    StochasticValues { k, d }
}

fn percent_k(close: f64, lowest: f64, highest: f64) -> Option<f64> {
    let range = highest - lowest;
    if range == 0.0 || !range.is_finite() {
        return None;
    }
    let k = 100.0 * (close - lowest) / range;
    k.is_finite().then_some(k)
}
