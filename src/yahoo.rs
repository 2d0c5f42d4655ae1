use crate::provider::{MarketDataProvider, ProviderError};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration as StdDuration, SystemTime};
use stocktracer::models::{AnalystInsights, PriceBar, PriceSeries};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

const MAX_RETRIES: u32 = 5;

// --- Chart response (v8/finance/chart) ---

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    #[serde(rename = "gmtoffset")]
    gmt_offset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// --- Quote summary response (v10/finance/quoteSummary, financialData module) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    financial_data: Option<FinancialData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    recommendation_key: Option<String>,
    target_mean_price: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Calendar-date converter for the exchange the bars were traded on.
enum ExchangeClock {
    Named(Tz),
    Offset(FixedOffset),
}

impl ExchangeClock {
    fn from_meta(meta: &ChartMeta) -> Self {
        if let Some(tz) = meta.exchange_timezone_name.as_deref().and_then(|n| n.parse::<Tz>().ok()) {
            return ExchangeClock::Named(tz);
        }
        let offset = meta
            .gmt_offset
            .and_then(FixedOffset::east_opt)
            .or_else(|| FixedOffset::east_opt(0));
        match offset {
            Some(offset) => ExchangeClock::Offset(offset),
            None => ExchangeClock::Named(chrono_tz::UTC),
        }
    }

    fn date_of(&self, time: DateTime<Utc>) -> NaiveDate {
        match self {
            ExchangeClock::Named(tz) => time.with_timezone(tz).date_naive(),
            ExchangeClock::Offset(offset) => time.with_timezone(offset).date_naive(),
        }
    }
}

fn upstream_message(error: UpstreamError) -> ProviderError {
    if error.description.is_empty() {
        ProviderError::Upstream(error.code)
    } else {
        ProviderError::Upstream(error.description)
    }
}

/// Parse a chart response into daily bars. Rows with any missing OHLC value
/// are skipped; a result without timestamps is an empty series.
pub fn parse_chart(body: &str) -> Result<PriceSeries, ProviderError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;
    if let Some(error) = envelope.chart.error {
        return Err(upstream_message(error));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty());
    };

    let clock = ExchangeClock::from_meta(&result.meta);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let length = result.timestamp.len();
    if [quote.open.len(), quote.high.len(), quote.low.len(), quote.close.len()]
        .iter()
        .any(|&len| len != length)
    {
        return Err(ProviderError::InvalidResponse("Inconsistent array lengths".to_string()));
    }

    let mut bars = Vec::with_capacity(length);
    let mut skipped = 0usize;
    for (i, &timestamp) in result.timestamp.iter().enumerate() {
        let time = DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
            ProviderError::InvalidResponse(format!("Cannot convert timestamp {} at index {}", timestamp, i))
        })?;

        let (Some(open), Some(high), Some(low), Some(close)) =
            (quote.open[i], quote.high[i], quote.low[i], quote.close[i])
        else {
            skipped += 1;
            continue;
        };
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0) as u64;

        bars.push(PriceBar::new(clock.date_of(time), open, high, low, close, volume));
    }

    if skipped > 0 {
        debug!(skipped, "Skipped bars with missing prices");
    }

    Ok(PriceSeries::from_unsorted(bars))
}

/// Parse the `financialData` module of a quote summary response.
pub fn parse_quote_summary(body: &str) -> Result<AnalystInsights, ProviderError> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)?;
    if let Some(error) = envelope.quote_summary.error {
        return Err(upstream_message(error));
    }

    let financial = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.financial_data)
        .ok_or_else(|| ProviderError::InvalidResponse("Missing financialData".to_string()))?;

    Ok(AnalystInsights::new(
        financial.recommendation_key.as_deref(),
        financial.target_mean_price.and_then(|p| p.raw),
    ))
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

pub struct YahooClient {
    client: Client,
    base_url: String,
    rate_limit_per_minute: u32,
    request_timestamps: Mutex<Vec<SystemTime>>,
    user_agents: Vec<String>,
    random_agent: bool,
}

impl YahooClient {
    pub fn new(
        base_url: &str,
        timeout: StdDuration,
        random_agent: bool,
        rate_limit_per_minute: u32,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        Ok(YahooClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limit_per_minute: rate_limit_per_minute.max(1),
            request_timestamps: Mutex::new(Vec::new()),
            user_agents,
            random_agent,
        })
    }

    fn get_user_agent(&self) -> &str {
        if self.random_agent {
            use rand::seq::IndexedRandom;
            if let Some(agent) = self.user_agents.choose(&mut rand::rng()) {
                return agent;
            }
        }
        self.user_agents.first().map(String::as_str).unwrap_or("Mozilla/5.0")
    }

    async fn enforce_rate_limit(&self) {
        let mut timestamps = self.request_timestamps.lock().await;
        let current_time = SystemTime::now();
        let window = StdDuration::from_secs(60);

        timestamps.retain(|&timestamp| {
            current_time.duration_since(timestamp).unwrap_or_default() < window
        });

        if timestamps.len() >= self.rate_limit_per_minute as usize {
            if let Some(&oldest_request) = timestamps.first() {
                let wait_time = window.saturating_sub(current_time.duration_since(oldest_request).unwrap_or_default());
                if !wait_time.is_zero() {
                    debug!(wait_ms = wait_time.as_millis() as u64, "Outbound rate limit reached, waiting");
                    sleep(wait_time + StdDuration::from_millis(100)).await;
                }
            }
        }

        timestamps.push(SystemTime::now());
    }

    /// GET with retries. A 404 body is returned to the caller because Yahoo
    /// reports unknown symbols as JSON with that status.
    async fn make_request(&self, url: &str, query: &[(&str, String)]) -> Result<String, ProviderError> {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..MAX_RETRIES {
            self.enforce_rate_limit().await;

            if attempt > 0 {
                let delay = StdDuration::from_secs_f64(2.0_f64.powi(attempt as i32 - 1) + rand::random::<f64>());
                sleep(delay.min(StdDuration::from_secs(60))).await;
            }

            let response = self
                .client
                .get(url)
                .query(query)
                .header("Accept", "application/json, text/plain, */*")
                .header("Accept-Language", "en-US,en;q=0.9")
                .header("User-Agent", self.get_user_agent())
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() || status == StatusCode::NOT_FOUND {
                        return Ok(resp.text().await?);
                    }
                    if status == StatusCode::FORBIDDEN
                        || status == StatusCode::TOO_MANY_REQUESTS
                        || status.is_server_error()
                    {
                        warn!(%status, attempt, "Retryable upstream status");
                        last_error = Some(ProviderError::Upstream(format!("HTTP {}", status)));
                        continue;
                    }
                    return Err(ProviderError::Upstream(format!("HTTP {}", status)));
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Request failed");
                    last_error = Some(ProviderError::Http(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::InvalidResponse("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    #[instrument(skip(self), fields(provider = "yahoo"))]
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        if start >= end {
            return Ok(PriceSeries::empty());
        }

        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let query = [
            ("period1", unix_midnight(start).to_string()),
            ("period2", unix_midnight(end).to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ];

        let body = self.make_request(&url, &query).await?;
        let series = parse_chart(&body)?.between(start, end);
        debug!(bars = series.len(), "Fetched daily history");
        Ok(series)
    }

    #[instrument(skip(self), fields(provider = "yahoo"))]
    async fn fetch_insights(&self, ticker: &str) -> Result<AnalystInsights, ProviderError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker);
        let query = [("modules", "financialData".to_string())];
        let body = self.make_request(&url, &query).await?;
        parse_quote_summary(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart_fixture() -> String {
        // 2024-01-04 and 2024-01-05 14:30 UTC (09:30 New York), then a
        // bar at 2024-01-08 03:00 UTC which is still 2024-01-07 in New York
        json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "AAPL",
                        "exchangeTimezoneName": "America/New_York",
                        "gmtoffset": -18000
                    },
                    "timestamp": [1704378600, 1704465000, 1704682800, 1704292200],
                    "indicators": {
                        "quote": [{
                            "open":   [182.15, 181.99, 183.0, null],
                            "high":   [183.09, 182.76, 184.0, null],
                            "low":    [180.88, 180.17, 182.0, null],
                            "close":  [181.91, 181.18, 183.5, null],
                            "volume": [71983600, 62303300, null, null]
                        }]
                    }
                }],
                "error": null
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_chart_converts_to_exchange_dates() {
        let series = parse_chart(&chart_fixture()).unwrap();
        let dates: Vec<String> = series.bars().iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-04", "2024-01-05", "2024-01-07"]);
        assert_eq!(series.bars()[0].volume, 71_983_600);
        assert_eq!(series.bars()[2].volume, 0);
        assert_eq!(series.bars()[1].close, 181.18);
    }

    #[test]
    fn test_parse_chart_falls_back_to_gmtoffset() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "exchangeTimezoneName": "Not/AZone", "gmtoffset": -18000 },
                    "timestamp": [1704682800],
                    "indicators": { "quote": [{
                        "open": [1.0], "high": [2.0], "low": [0.5], "close": [1.5], "volume": [10]
                    }] }
                }],
                "error": null
            }
        })
        .to_string();
        let series = parse_chart(&body).unwrap();
        assert_eq!(series.bars()[0].date, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
    }

    #[test]
    fn test_parse_chart_without_timestamps_is_empty() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "exchangeTimezoneName": "America/New_York" },
                    "indicators": { "quote": [{}] }
                }],
                "error": null
            }
        })
        .to_string();
        assert!(parse_chart(&body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_upstream_error() {
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        })
        .to_string();
        match parse_chart(&body) {
            Err(ProviderError::Upstream(msg)) => assert_eq!(msg, "No data found, symbol may be delisted"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_chart_rejects_ragged_columns() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": {},
                    "timestamp": [1704378600, 1704465000],
                    "indicators": { "quote": [{
                        "open": [1.0], "high": [2.0, 2.0], "low": [0.5, 0.5], "close": [1.5, 1.5]
                    }] }
                }],
                "error": null
            }
        })
        .to_string();
        assert!(matches!(parse_chart(&body), Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_chart_garbage() {
        assert!(matches!(parse_chart("<html>"), Err(ProviderError::Serialization(_))));
    }

    #[test]
    fn test_parse_quote_summary() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "financialData": {
                        "recommendationKey": "buy",
                        "targetMeanPrice": { "raw": 231.456, "fmt": "231.46" }
                    }
                }],
                "error": null
            }
        })
        .to_string();
        let insights = parse_quote_summary(&body).unwrap();
        assert_eq!(insights.recommendation.as_deref(), Some("Buy"));
        assert_eq!(insights.target_mean_price, Some(231.46));
    }

    #[test]
    fn test_parse_quote_summary_partial() {
        let body = json!({
            "quoteSummary": {
                "result": [{ "financialData": { "recommendationKey": "none", "targetMeanPrice": {} } }],
                "error": null
            }
        })
        .to_string();
        let insights = parse_quote_summary(&body).unwrap();
        assert_eq!(insights, AnalystInsights::unavailable());
    }

    #[test]
    fn test_unix_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(unix_midnight(date), 1704412800);
    }

    #[tokio::test]
    async fn test_empty_range_skips_network() {
        let client = YahooClient::new("http://127.0.0.1:9", StdDuration::from_secs(1), false, 60).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert!(client.fetch_history("AAPL", day, day).await.unwrap().is_empty());
    }
}
