//! # stocktracer - weekday stock analysis
//!
//! Filters a daily price series down to one weekday and computes:
//! - per-row high-low variance
//! - Stochastic Oscillator (%K / %D) and RSI over rolling windows
//! - summary statistics that tolerate missing indicator values
//!
//! ## Quick Start
//!
//! ```rust
//! use stocktracer::prelude::*;
//! use chrono::{NaiveDate, Weekday};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
//! let series = PriceSeries::new(vec![PriceBar::new(day, 10.0, 11.0, 9.5, 10.5, 1_000)]).unwrap();
//! let analysis = analyze(&series, Weekday::Fri, &AnalysisConfig::default()).unwrap();
//! assert_eq!(analysis.rows.len(), 1);
//! assert_eq!(analysis.summary.average_k.to_string(), "N/A");
//! ```

pub mod analysis;
pub mod error;
pub mod models;
pub mod report;
pub mod services;
pub mod utils;

pub use error::TracerError;

// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{analyze, AnalysisConfig, IndicatorBasis, IndicatorConfig, WeekdayAnalysis};
    pub use crate::error::TracerError;
    pub use crate::models::{
        AnalystInsights, FilteredRow, IndicatorRow, MetricValue, PriceBar, PriceSeries, SummaryStats,
    };
    pub use crate::report::{build_report, SortOrder, WeekdayReport};
}

pub use utils::{init_logger, Logger, Timer};
