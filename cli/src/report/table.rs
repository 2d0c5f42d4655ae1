use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::models::IndicatorRow;
use crate::utils::{format_date, round2};

pub const COLUMNS: [&str; 10] = [
    "Date", "Open", "High", "Low", "Close", "Volume", "Variance", "%K", "%D", "RSI",
];

/// Display order of table rows. Analysis rows are always oldest first; the
/// table defaults to most recent at the top.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desc" | "descending" => Ok(SortOrder::Descending),
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// One display row, prices rounded to 2 dp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Variance")]
    pub variance: f64,
    #[serde(rename = "%K")]
    pub k: Option<f64>,
    #[serde(rename = "%D")]
    pub d: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
}

impl TableRow {
    pub fn from_indicator_row(row: &IndicatorRow) -> Self {
        let bar = row.bar();
        Self {
            date: format_date(bar.date),
            open: round2(bar.open),
            high: round2(bar.high),
            low: round2(bar.low),
            close: round2(bar.close),
            volume: bar.volume,
            variance: round2(row.row.variance),
            k: row.k.map(round2),
            d: row.d.map(round2),
            rsi: row.rsi.map(round2),
        }
    }

    /// Cell texts in [`COLUMNS`] order, missing values as `N/A`.
    pub fn cells(&self) -> [String; 10] {
        [
            self.date.clone(),
            format!("{:.2}", self.open),
            format!("{:.2}", self.high),
            format!("{:.2}", self.low),
            format!("{:.2}", self.close),
            self.volume.to_string(),
            format!("{:.2}", self.variance),
            format_optional(self.k),
            format_optional(self.d),
            format_optional(self.rsi),
        ]
    }
}

pub fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
}

pub fn table_rows(rows: &[IndicatorRow], order: SortOrder) -> Vec<TableRow> {
    let mut table: Vec<TableRow> = rows.iter().map(TableRow::from_indicator_row).collect();
    if order == SortOrder::Descending {
        table.reverse();
    }
    table
}

/// Right-aligned plain text table with a header row.
pub fn render_text_table(rows: &[TableRow]) -> String {
    let body: Vec<[String; 10]> = rows.iter().map(TableRow::cells).collect();

    let mut widths = COLUMNS.map(str::len);
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for cells in &body {
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize; 10]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}
