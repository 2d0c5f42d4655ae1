//! Weekday filter, indicator engine and summary aggregator.

pub mod filter;
pub mod indicators;
pub mod pipeline;
pub mod rolling;
pub mod rsi;
pub mod stochastic;
pub mod summary;

pub use filter::{filter_by_weekday, with_variance};
pub use indicators::{annotate, IndicatorConfig, MAX_PERIOD};
pub use pipeline::{analyze, AnalysisConfig, IndicatorBasis, WeekdayAnalysis};
pub use rsi::{rsi, DEFAULT_RSI_PERIOD};
pub use stochastic::{stochastic, StochasticValues, DEFAULT_SMOOTHING_PERIOD, DEFAULT_STOCHASTIC_PERIOD};
pub use summary::summarize;
