use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use std::{fs::File, io, path::Path};

use crate::{
    models::{PriceBar, PriceSeries},
    report::{TableRow, COLUMNS},
    utils::{Logger, Timer},
};

/// One CSV record. Accepts the common export headers (`Date,Open,High,Low,
/// Close,Adj Close,Volume` or lowercase). `null` or empty cells are read as
/// missing and the row is skipped.
#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(alias = "Date", alias = "time", alias = "Time")]
    date: String,
    #[serde(alias = "Open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(alias = "High", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(alias = "Low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(alias = "Close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(alias = "Volume", default, deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

impl RawBar {
    fn to_price_bar(&self) -> anyhow::Result<Option<PriceBar>> {
        // tolerate timestamps such as "2024-01-05 00:00:00-05:00"
        let date_part = self.date.get(..10).unwrap_or(&self.date);
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}'", self.date))?;

        let (Some(open), Some(high), Some(low), Some(close)) = (self.open, self.high, self.low, self.close) else {
            return Ok(None);
        };
        let volume = self.volume.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0) as u64;

        Ok(Some(PriceBar::new(date, open, high, low, close, volume)))
    }
}

/// Read a daily price series from CSV. Rows may come in any order; a repeated
/// date keeps its last row.
pub fn read_series<R: io::Read>(reader: R) -> anyhow::Result<PriceSeries> {
    let logger = Logger::new("CSV_SERVICE");
    let timer = Timer::start("csv parse");

    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    let mut skipped = 0usize;

    for (index, record) in csv_reader.deserialize::<RawBar>().enumerate() {
        let raw = record.with_context(|| format!("malformed CSV record {}", index + 1))?;
        match raw.to_price_bar()? {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        logger.warn(&format!("Skipped {} rows with missing prices", skipped));
    }

    let series = PriceSeries::from_unsorted(bars);
    logger.info(&format!(
        "Loaded {} bars ({} to {}) in {:.1}ms",
        series.len(),
        series.first_date().map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
        series.last_date().map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
        timer.elapsed_ms()
    ));
    Ok(series)
}

pub fn load_series_file(path: &Path) -> anyhow::Result<PriceSeries> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    read_series(file)
}

/// Write display rows as CSV, missing values as `N/A`.
pub fn write_rows<W: io::Write>(writer: W, rows: &[TableRow]) -> anyhow::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for row in rows {
        csv_writer.write_record(row.cells())?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilteredRow, IndicatorRow};
    use crate::report::{table_rows, SortOrder};
    use std::io::Write;

    const YAHOO_EXPORT: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-05,181.99,182.76,180.17,181.18,180.30,62303300
2024-01-03,184.22,185.88,183.43,184.25,183.35,58414500
2024-01-04,182.15,183.09,180.88,181.91,181.02,71983600
2024-01-08,null,null,null,null,null,null
";

    #[test]
    fn test_read_series_sorts_and_skips_nulls() {
        let series = read_series(YAHOO_EXPORT.as_bytes()).unwrap();
        assert_eq!(series.len(), 3);
        let dates: Vec<String> = series.bars().iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-04", "2024-01-05"]);
        assert_eq!(series.bars()[2].volume, 62_303_300);
    }

    #[test]
    fn test_lowercase_headers_and_timestamps() {
        let csv = "date,open,high,low,close,volume\n2024-02-01 00:00:00-05:00,1,2,0.5,1.5,10\n";
        let series = read_series(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let csv = "Date,Open,High,Low,Close,Volume\nyesterday,1,2,0.5,1.5,10\n";
        assert!(read_series(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_series_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAHOO_EXPORT.as_bytes()).unwrap();
        let series = load_series_file(file.path()).unwrap();
        assert_eq!(series.len(), 3);
        assert!(load_series_file(Path::new("/definitely/not/here.csv")).is_err());
    }

    #[test]
    fn test_write_rows_uses_na() {
        let bar = PriceBar::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), 1.0, 2.0, 0.5, 1.5, 9);
        let rows = vec![IndicatorRow {
            row: FilteredRow::from_bar(&bar),
            k: None,
            d: None,
            rsi: Some(61.234),
        }];
        let mut out = Vec::new();
        write_rows(&mut out, &table_rows(&rows, SortOrder::Descending)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Date,Open,High,Low,Close,Volume,Variance,%K,%D,RSI\n2024-01-05,1.00,2.00,0.50,1.50,9,1.50,N/A,N/A,61.23\n"
        );
    }
}
