use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::Duration;
use stocktracer::analysis::{
    AnalysisConfig, IndicatorBasis, IndicatorConfig, DEFAULT_RSI_PERIOD, DEFAULT_STOCHASTIC_PERIOD,
};
use stocktracer::utils::{DEFAULT_LOOKBACK_WEEKS, MAX_LOOKBACK_WEEKS};

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

// YAML-serializable configuration structure; omitted keys take the env defaults
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct ConfigYaml {
    pub node_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub yahoo_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
    pub rate_limit_per_minute: Option<u32>,
    pub inbound_per_second: Option<u64>,
    pub inbound_burst: Option<u32>,
    pub stochastic_period: Option<usize>,
    pub rsi_period: Option<usize>,
    pub indicator_basis: Option<IndicatorBasis>,
    pub default_ticker: Option<String>,
    pub default_lookback_weeks: Option<i64>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub yahoo_base_url: String,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub rate_limit_per_minute: u32,
    pub inbound_per_second: u64,
    pub inbound_burst: u32,
    pub analysis: AnalysisConfig,
    pub default_ticker: String,
    pub default_lookback_weeks: i64,
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml(file_path: &str) -> anyhow::Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> anyhow::Result<Self> {
        let yaml_config: ConfigYaml =
            serde_yaml::from_str(yaml_content).context("Failed to parse YAML config")?;
        Ok(Self::from_parts(yaml_config))
    }

    // Load all configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let indicator_basis = match env::var("INDICATOR_BASIS") {
            Ok(raw) => Some(
                raw.parse::<IndicatorBasis>()
                    .map_err(|e| anyhow::anyhow!("INDICATOR_BASIS: {}", e))?,
            ),
            Err(_) => None,
        };

        Ok(Self::from_parts(ConfigYaml {
            node_name: env::var("NODE_NAME").ok(),
            environment: env::var("ENVIRONMENT").ok(),
            port: parse_env("PORT"),
            yahoo_base_url: env::var("YAHOO_BASE_URL").ok(),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS"),
            cache_ttl_secs: parse_env("CACHE_TTL_SECS"),
            rate_limit_per_minute: parse_env("RATE_LIMIT_PER_MINUTE"),
            inbound_per_second: parse_env("INBOUND_PER_SECOND"),
            inbound_burst: parse_env("INBOUND_BURST"),
            stochastic_period: parse_env("STOCHASTIC_PERIOD"),
            rsi_period: parse_env("RSI_PERIOD"),
            indicator_basis,
            default_ticker: env::var("DEFAULT_TICKER").ok(),
            default_lookback_weeks: parse_env("DEFAULT_LOOKBACK_WEEKS"),
        }))
    }

    fn from_parts(raw: ConfigYaml) -> Self {
        let analysis = AnalysisConfig {
            indicators: IndicatorConfig {
                stochastic_period: raw.stochastic_period.unwrap_or(DEFAULT_STOCHASTIC_PERIOD),
                rsi_period: raw.rsi_period.unwrap_or(DEFAULT_RSI_PERIOD),
                ..IndicatorConfig::default()
            },
            basis: raw.indicator_basis.unwrap_or_default(),
        };

        Self {
            node_name: raw.node_name.unwrap_or_else(|| "stocktracer".to_string()),
            environment: raw.environment.unwrap_or_else(|| "development".to_string()),
            port: raw.port.unwrap_or(8888),
            yahoo_base_url: raw
                .yahoo_base_url
                .unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(raw.request_timeout_secs.unwrap_or(30)),
            cache_ttl: Duration::from_secs(raw.cache_ttl_secs.unwrap_or(3600)),
            rate_limit_per_minute: raw.rate_limit_per_minute.unwrap_or(60).max(1),
            inbound_per_second: raw.inbound_per_second.unwrap_or(1).max(1),
            inbound_burst: raw.inbound_burst.unwrap_or(20).max(1),
            analysis,
            default_ticker: raw
                .default_ticker
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "AAPL".to_string()),
            default_lookback_weeks: raw
                .default_lookback_weeks
                .filter(|w| *w > 0)
                .map(|w| w.min(MAX_LOOKBACK_WEEKS))
                .unwrap_or(DEFAULT_LOOKBACK_WEEKS),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
