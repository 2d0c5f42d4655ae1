//! Relative Strength Index using simple rolling means of gains and losses.

use super::rolling::rolling_mean;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// RSI per row. The first `period` rows are missing since the first row has
/// no price change.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if closes.is_empty() {
        return Vec::new();
    }

    let deltas: Vec<Option<f64>> = std::iter::once(None)
        .chain(closes.windows(2).map(|pair| Some(pair[1] - pair[0])))
        .collect();
    let gains: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|d| d.max(0.0))).collect();
    let losses: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| rsi_from_averages(gain?, loss?))
        .collect()
}

/// `100 - 100 / (1 + gain / loss)`, saturating at 100 when there were no
/// losses. A window with neither gains nor losses has no RSI.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return (avg_gain > 0.0).then_some(100.0);
    }
    let rs = avg_gain / avg_loss;
    let value = 100.0 - 100.0 / (1.0 + rs);
    value.is_finite().then_some(value)
}
