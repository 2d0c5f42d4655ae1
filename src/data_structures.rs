use crate::config::AppConfig;
use crate::provider::SharedProvider;
use axum::extract::FromRef;
use std::sync::Arc;
use stocktracer::analysis::AnalysisConfig;

// --- Request defaults shared by every handler ---

#[derive(Clone, Debug)]
pub struct ServiceDefaults {
    pub ticker: String,
    pub lookback_weeks: i64,
    pub analysis: AnalysisConfig,
}

impl ServiceDefaults {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ticker: config.default_ticker.clone(),
            lookback_weeks: config.default_lookback_weeks,
            analysis: config.analysis,
        }
    }
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            lookback_weeks: stocktracer::utils::DEFAULT_LOOKBACK_WEEKS,
            analysis: AnalysisConfig::default(),
        }
    }
}

pub type SharedDefaults = Arc<ServiceDefaults>;

// --- Application state ---

#[derive(Clone)]
pub struct AppState {
    pub provider: SharedProvider,
    pub defaults: SharedDefaults,
}

impl AppState {
    pub fn new(provider: SharedProvider, defaults: ServiceDefaults) -> Self {
        Self {
            provider,
            defaults: Arc::new(defaults),
        }
    }
}

impl FromRef<AppState> for SharedProvider {
    fn from_ref(app_state: &AppState) -> SharedProvider {
        app_state.provider.clone()
    }
}

impl FromRef<AppState> for SharedDefaults {
    fn from_ref(app_state: &AppState) -> SharedDefaults {
        app_state.defaults.clone()
    }
}
