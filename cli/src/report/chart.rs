//! Chart payloads for the OHLC, Stochastic and RSI panels.
//!
//! Values are not rounded here; missing indicator values stay `None` and
//! serialise to `null` so the renderer draws a gap.

use serde::Serialize;

use crate::analysis::WeekdayAnalysis;
use crate::utils::{format_date, weekday_name};

pub const STOCH_OVERBOUGHT: f64 = 80.0;
pub const STOCH_OVERSOLD: f64 = 20.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcChart {
    pub title: String,
    pub name: String,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub height: u32,
    pub dates: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTrace {
    pub name: &'static str,
    pub color: &'static str,
    pub values: Vec<Option<f64>>,
}

/// Horizontal dashed reference line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuideLine {
    pub value: f64,
    pub color: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub height: u32,
    pub dates: Vec<String>,
    pub traces: Vec<LineTrace>,
    pub guides: Vec<GuideLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub ohlc: OhlcChart,
    pub stochastic: LineChart,
    pub rsi: LineChart,
}

pub fn build_charts(ticker: &str, analysis: &WeekdayAnalysis) -> ChartSet {
    let day = weekday_name(analysis.weekday);
    let rows = &analysis.rows;
    let dates: Vec<String> = rows.iter().map(|r| format_date(r.date())).collect();

    let ohlc = OhlcChart {
        title: format!("{} Stock OHLC Chart on {}s", ticker, day),
        name: ticker.to_string(),
        x_title: "Date",
        y_title: "Price (USD)",
        height: 600,
        dates: dates.clone(),
        open: rows.iter().map(|r| r.bar().open).collect(),
        high: rows.iter().map(|r| r.bar().high).collect(),
        low: rows.iter().map(|r| r.bar().low).collect(),
        close: rows.iter().map(|r| r.bar().close).collect(),
    };

    let stochastic = LineChart {
        title: format!("{} Stochastic Oscillator on {}s", ticker, day),
        x_title: "Date",
        y_title: "Stochastic (%K, %D)",
        height: 400,
        dates: dates.clone(),
        traces: vec![
            LineTrace {
                name: "%K",
                color: "blue",
                values: rows.iter().map(|r| r.k).collect(),
            },
            LineTrace {
                name: "%D",
                color: "red",
                values: rows.iter().map(|r| r.d).collect(),
            },
        ],
        guides: vec![
            GuideLine { value: STOCH_OVERBOUGHT, color: "red", label: "Overbought" },
            GuideLine { value: STOCH_OVERSOLD, color: "green", label: "Oversold" },
        ],
    };

    let rsi = LineChart {
        title: format!("{} RSI on {}s", ticker, day),
        x_title: "Date",
        y_title: "RSI",
        height: 400,
        dates,
        traces: vec![LineTrace {
            name: "RSI",
            color: "purple",
            values: rows.iter().map(|r| r.rsi).collect(),
        }],
        guides: vec![
            GuideLine { value: RSI_OVERBOUGHT, color: "red", label: "Overbought" },
            GuideLine { value: RSI_OVERSOLD, color: "green", label: "Oversold" },
        ],
    };

    ChartSet { ohlc, stochastic, rsi }
}
