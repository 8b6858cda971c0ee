//! DeepBook Market Engine - service binary
//!
//! Polls the DeepBook indexer for the configured pool, keeps the latest
//! order book snapshot with its depth view, and serves health, metrics and
//! depth and recent trades over HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deepbook_market_engine::{
    telemetry, AppState, Config, IndexerClient, MarketPoller, MarketSummary, OrderBookManager,
    OrderBookState, PoolRegistry, Trade,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting DeepBook Market Engine");

    // Load configuration
    let config = Arc::new(Config::load()?);
    info!(pool = %config.pool_name, indexer = %config.indexer_endpoint, "Configuration loaded");

    // Bootstrap the pool registry
    let client = IndexerClient::new(&config.indexer_endpoint)?;
    let registry = PoolRegistry::new(client.fetch_pools().await?, config.pools_ttl());
    let market = registry.market(&config.pool_name, config.price_scalar_exponent)?;
    let precision = market.precision();
    info!(
        pool = %config.pool_name,
        pools = registry.len(),
        base_precision = precision.base,
        quote_precision = precision.quote,
        display_precision = precision.display,
        "Pool registry loaded"
    );

    // Create shared application state
    let state = Arc::new(AppState {
        orderbook_manager: Arc::new(RwLock::new(OrderBookManager::with_depth(
            config.depth_levels,
        ))),
        pools: Arc::new(RwLock::new(registry)),
        summaries: Arc::new(RwLock::new(Vec::new())),
        trades: Arc::new(RwLock::new(HashMap::new())),
        config: config.clone(),
    });

    // Start HTTP server
    let http_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_http_server(http_state).await {
            warn!(error = %e, "HTTP server error");
        }
    });

    // Start polling
    let mut poller = MarketPoller::new(state, client);
    poller.run().await?;

    Ok(())
}

/// Start HTTP server for health checks, metrics and depth views
async fn start_http_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr: SocketAddr = state.config.http_addr.parse()?;

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/depth/:pool", get(depth))
        .route("/summary", get(summary))
        .route("/trades/:pool", get(trades))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let manager = state.orderbook_manager.read().await;
    let pool = &state.config.pool_name;
    let healthy = manager
        .get_state(pool)
        .map(|s| s.metrics.is_healthy())
        .unwrap_or(false);

    Json(serde_json::json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "component": "deepbook-market-engine",
        "pool": pool,
        "version": manager.version(pool),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn metrics() -> Result<String, (StatusCode, String)> {
    telemetry::render().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

async fn depth(
    State(state): State<Arc<AppState>>,
    Path(pool): Path<String>,
) -> Result<Json<OrderBookState>, StatusCode> {
    state
        .orderbook_manager
        .read()
        .await
        .get_state(&pool)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn summary(State(state): State<Arc<AppState>>) -> Json<Vec<MarketSummary>> {
    Json(state.summaries.read().await.clone())
}

async fn trades(
    State(state): State<Arc<AppState>>,
    Path(pool): Path<String>,
) -> Result<Json<Vec<Trade>>, StatusCode> {
    state
        .trades
        .read()
        .await
        .get(&pool)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
