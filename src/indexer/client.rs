//! HTTP client for the DeepBook indexer
//!
//! Fetches pool metadata, order book snapshots, market summaries and
//! recent trades.

use reqwest::header::CONTENT_TYPE;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::orderbook::mid_price;
use crate::parser::{MarketSummary, OrderBookSnapshot, Trade};
use crate::pool::Pool;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a single indexer endpoint
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    endpoint: String,
}

impl IndexerClient {
    /// Create a new indexer client
    pub fn new(endpoint: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// All pools known to the exchange
    pub async fn fetch_pools(&self) -> Result<Vec<Pool>> {
        self.get("/get_pools").await
    }

    /// Order book snapshot with up to `depth` levels per side
    pub async fn fetch_orderbook(&self, pool_name: &str, depth: usize) -> Result<OrderBookSnapshot> {
        self.get(&orderbook_path(pool_name, depth)).await
    }

    /// Mid price from the top of the book
    pub async fn fetch_mid_price(&self, pool_name: &str) -> Result<Option<Decimal>> {
        let top = self.fetch_orderbook(pool_name, 1).await?;
        Ok(mid_price(
            top.best_bid().map(|level| level.price),
            top.best_ask().map(|level| level.price),
        ))
    }

    /// 24h summary for every pair
    pub async fn fetch_summary(&self) -> Result<Vec<MarketSummary>> {
        self.get("/summary").await
    }

    /// Most recent `limit` trades for a pool, newest first
    pub async fn fetch_trades(&self, pool_name: &str, limit: usize) -> Result<Vec<Trade>> {
        self.get(&trades_path(pool_name, limit)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(url = %url, "Fetching from indexer");

        let response = self
            .http
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            return Err(EngineError::RestApiError(error_message(&body, status.as_u16())));
        }

        Ok(response.json::<T>().await?)
    }
}

fn orderbook_path(pool_name: &str, depth: usize) -> String {
    format!("/orderbook/{pool_name}?depth={depth}")
}

fn trades_path(pool_name: &str, limit: usize) -> String {
    format!("/trades/{pool_name}?limit={limit}")
}

/// Prefer the server's `message` field, fall back to the status code
fn error_message(body: &serde_json::Value, status: u16) -> String {
    body.get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}
