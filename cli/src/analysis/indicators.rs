use serde::{Deserialize, Serialize};

use super::rsi::{rsi, DEFAULT_RSI_PERIOD};
use super::stochastic::{stochastic, DEFAULT_SMOOTHING_PERIOD, DEFAULT_STOCHASTIC_PERIOD};
use crate::error::{Result, TracerError};
use crate::models::{FilteredRow, IndicatorRow};

/// Longest window any indicator accepts.
pub const MAX_PERIOD: usize = 10_000;

/// Window lengths for the indicator engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub stochastic_period: usize,
    pub smoothing_period: usize,
    pub rsi_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            stochastic_period: DEFAULT_STOCHASTIC_PERIOD,
            smoothing_period: DEFAULT_SMOOTHING_PERIOD,
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("stochastic", self.stochastic_period),
            ("%D smoothing", self.smoothing_period),
            ("RSI", self.rsi_period),
        ] {
            if value == 0 || value > MAX_PERIOD {
                return Err(TracerError::InvalidPeriod { name, value });
            }
        }
        Ok(())
    }
}

/// Attach %K, %D and RSI to each row. Windows advance over `rows` exactly as
/// given, so the caller decides whether that is the daily series or a single
/// weekday.
pub fn annotate(rows: Vec<FilteredRow>, config: &IndicatorConfig) -> Vec<IndicatorRow> {
    let highs: Vec<f64> = rows.iter().map(|r| r.bar.high).collect();
    let lows: Vec<f64> = rows.iter().map(|r| r.bar.low).collect();
    let closes: Vec<f64> = rows.iter().map(|r| r.bar.close).collect();

    let stoch = stochastic(
        &highs,
        &lows,
        &closes,
        config.stochastic_period,
        config.smoothing_period,
    );
    let rsi_values = rsi(&closes, config.rsi_period);

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| IndicatorRow {
            row,
            k: stoch.k[i],
            d: stoch.d[i],
            rsi: rsi_values[i],
        })
        .collect()
}
