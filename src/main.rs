pub mod api;
pub mod config;
pub mod data_structures;
pub mod page;
pub mod provider;
pub mod utils;
pub mod yahoo;

use crate::data_structures::{AppState, ServiceDefaults};
use crate::provider::{CachedProvider, SharedProvider};
use crate::utils::cache::FileCache;
use crate::yahoo::YahooClient;
use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::AppConfig::load()?;

    // Initialize tracing with node_name in all logs
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting stocktracer-web");
    tracing::info!(
        ?app_config.environment,
        port = app_config.port,
        basis = %app_config.analysis.basis,
        "Loaded configuration"
    );

    let yahoo = YahooClient::new(
        &app_config.yahoo_base_url,
        app_config.request_timeout,
        true,
        app_config.rate_limit_per_minute,
    )
    .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

    let cache = FileCache::in_temp_dir(app_config.cache_ttl);
    cache.init().context("Failed to create cache directory")?;
    let provider: SharedProvider = Arc::new(CachedProvider::new(Arc::new(yahoo), cache.clone()));

    tracing::info!(ttl_secs = cache.ttl().as_secs(), "Spawning cache cleanup task");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cache.ttl().max(std::time::Duration::from_secs(60)));
        loop {
            ticker.tick().await;
            if let Err(e) = cache.cleanup_expired() {
                tracing::warn!(error = %e, "Cache cleanup failed");
            }
        }
    });

    let app_state = AppState::new(provider, ServiceDefaults::from_config(&app_config));

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(app_config.inbound_per_second)
            .burst_size(app_config.inbound_burst)
            .finish()
            .context("Invalid inbound rate limit configuration")?,
    );

    let app = api::router(app_state)
        .layer(GovernorLayer::new(governor_conf))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
