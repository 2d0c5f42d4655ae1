//! Market data provider seam.
//!
//! Handlers only see [`MarketDataProvider`]; the Yahoo client implements it
//! and [`CachedProvider`] memoises daily history on disk per
//! `(ticker, start, end)`.

use crate::utils::cache::FileCache;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use stocktracer::models::{AnalystInsights, PriceSeries};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum ProviderError {
    Http(reqwest::Error),
    Serialization(serde_json::Error),
    InvalidTicker(String),
    InvalidResponse(String),
    Upstream(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        ProviderError::Http(error)
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::Serialization(error)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Http(e) => write!(f, "request failed: {}", e),
            ProviderError::Serialization(e) => write!(f, "unreadable response: {}", e),
            ProviderError::InvalidTicker(t) => write!(f, "invalid ticker '{}'", t),
            ProviderError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
            ProviderError::Upstream(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Trim and uppercase a ticker; empty or whitespace-containing input is rejected.
pub fn normalize_ticker(raw: &str) -> Result<String, ProviderError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() || ticker.chars().any(char::is_whitespace) || ticker.contains('/') {
        return Err(ProviderError::InvalidTicker(raw.to_string()));
    }
    Ok(ticker)
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars with `start <= date < end`. An empty series means the
    /// provider had nothing for the range.
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError>;

    async fn fetch_insights(&self, ticker: &str) -> Result<AnalystInsights, ProviderError>;
}

pub type SharedProvider = Arc<dyn MarketDataProvider>;

pub struct CachedProvider {
    inner: SharedProvider,
    cache: FileCache,
}

impl CachedProvider {
    pub fn new(inner: SharedProvider, cache: FileCache) -> Self {
        Self { inner, cache }
    }

    fn history_key(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!("history_{}_{}_{}.json", ticker, start.format("%Y%m%d"), end.format("%Y%m%d"))
    }
}

#[async_trait]
impl MarketDataProvider for CachedProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        let key = Self::history_key(ticker, start, end);

        if self.cache.is_valid(&key) {
            match self.cache.read(&key).map(|bytes| serde_json::from_slice::<PriceSeries>(&bytes)) {
                Ok(Ok(series)) => {
                    debug!(ticker, bars = series.len(), "Serving history from cache");
                    return Ok(series);
                }
                Ok(Err(e)) => warn!(ticker, error = %e, "Discarding unreadable cache entry"),
                Err(e) => warn!(ticker, error = %e, "Failed to read cache entry"),
            }
        }

        let series = self.inner.fetch_history(ticker, start, end).await?;

        // empty results are not cached so a retry can pick up late data
        if !series.is_empty() {
            match serde_json::to_vec(&series) {
                Ok(bytes) => {
                    if let Err(e) = self.cache.write(&key, &bytes) {
                        warn!(ticker, error = %e, "Failed to write cache entry");
                    }
                }
                Err(e) => warn!(ticker, error = %e, "Failed to serialize history for cache"),
            }
        }

        Ok(series)
    }

    async fn fetch_insights(&self, ticker: &str) -> Result<AnalystInsights, ProviderError> {
        self.inner.fetch_insights(ticker).await
    }
}
