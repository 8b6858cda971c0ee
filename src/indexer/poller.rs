//! Fixed-interval polling of the indexer
//!
//! Each fetched snapshot replaces the previous one wholesale inside the
//! shared order book manager. Every endpoint backs off on its own: after a
//! failure its ticks are skipped until the retry deadline passes, while the
//! other feeds keep running. The computation core itself never retries.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::IndexerClient;
use crate::error::Result;
use crate::orderbook::SnapshotUpdate;
use crate::telemetry;
use crate::AppState;

/// Maximum backoff delay in milliseconds (60 seconds)
const MAX_BACKOFF_MS: u64 = 60_000;

/// Indexer endpoints polled on their own interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Orderbook,
    Summary,
    Trades,
}

impl Feed {
    fn name(&self) -> &'static str {
        match self {
            Feed::Orderbook => "orderbook",
            Feed::Summary => "summary",
            Feed::Trades => "trades",
        }
    }
}

/// Failure count and retry deadline for one endpoint
#[derive(Debug, Default)]
struct Backoff {
    consecutive_failures: u32,
    retry_at: Option<Instant>,
}

impl Backoff {
    fn is_ready(&self, now: Instant) -> bool {
        self.retry_at.map_or(true, |deadline| now >= deadline)
    }

    /// Reset after a success, returning the failures it ended
    fn record_success(&mut self) -> u32 {
        self.retry_at = None;
        std::mem::take(&mut self.consecutive_failures)
    }

    /// Push the retry deadline out, returning the delay
    fn record_failure(&mut self, base_delay_ms: u64, now: Instant) -> Duration {
        self.consecutive_failures += 1;
        let delay = backoff_delay(base_delay_ms, self.consecutive_failures);
        self.retry_at = Some(now + delay);
        delay
    }
}

/// Polls order book, summary, trades and pool metadata for the configured pool
pub struct MarketPoller {
    state: Arc<AppState>,
    client: IndexerClient,
    orderbook_backoff: Backoff,
    summary_backoff: Backoff,
    trades_backoff: Backoff,
}

impl MarketPoller {
    /// Create a new market poller
    pub fn new(state: Arc<AppState>, client: IndexerClient) -> Self {
        Self {
            state,
            client,
            orderbook_backoff: Backoff::default(),
            summary_backoff: Backoff::default(),
            trades_backoff: Backoff::default(),
        }
    }

    /// Run the poller - runs indefinitely, backing off failing endpoints
    pub async fn run(&mut self) -> Result<()> {
        let config = Arc::clone(&self.state.config);
        info!(
            pool = %config.pool_name,
            orderbook_ms = config.orderbook_poll_ms,
            summary_ms = config.summary_poll_ms,
            trades_ms = config.trades_poll_ms,
            "Starting market poller"
        );

        let mut orderbook_tick = interval(config.orderbook_poll_interval());
        let mut summary_tick = interval(config.summary_poll_interval());
        let mut trades_tick = interval(config.trades_poll_interval());
        let mut status_tick = interval(config.status_interval());
        for tick in [
            &mut orderbook_tick,
            &mut summary_tick,
            &mut trades_tick,
            &mut status_tick,
        ] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        loop {
            tokio::select! {
                _ = orderbook_tick.tick() => self.poll_feed(Feed::Orderbook).await,
                _ = summary_tick.tick() => self.poll_feed(Feed::Summary).await,
                _ = trades_tick.tick() => self.poll_feed(Feed::Trades).await,
                _ = status_tick.tick() => {
                    if let Err(e) = self.refresh_pools_if_stale().await {
                        telemetry::record_fetch_error("get_pools");
                        warn!(error = %e, "Failed to refresh pool registry");
                    }
                    self.log_status().await;
                }
            }
        }
    }

    /// Poll one endpoint unless it is still backing off
    pub async fn poll_feed(&mut self, feed: Feed) {
        let now = Instant::now();
        if !self.backoff(feed).is_ready(now) {
            debug!(endpoint = feed.name(), "Skipping tick while backing off");
            return;
        }

        let result = match feed {
            Feed::Orderbook => self.poll_orderbook().await.map(|_| ()),
            Feed::Summary => self.poll_summary().await,
            Feed::Trades => self.poll_trades().await,
        };

        let base_delay_ms = self.state.config.reconnect_delay_ms;
        let backoff = self.backoff_mut(feed);
        match result {
            Ok(()) => {
                let previous_failures = backoff.record_success();
                if previous_failures > 0 {
                    info!(
                        endpoint = feed.name(),
                        previous_failures,
                        "Indexer fetch recovered"
                    );
                }
            }
            Err(e) => {
                telemetry::record_fetch_error(feed.name());
                let delay = backoff.record_failure(base_delay_ms, Instant::now());
                error!(error = %e, endpoint = feed.name(), "Indexer fetch failed");
                warn!(
                    endpoint = feed.name(),
                    attempt = backoff.consecutive_failures,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before next fetch"
                );
            }
        }
    }

    /// Fetch the order book and swap it in
    pub async fn poll_orderbook(&self) -> Result<SnapshotUpdate> {
        let config = &self.state.config;
        let snapshot = self
            .client
            .fetch_orderbook(&config.pool_name, config.depth_levels)
            .await?;

        let mut manager = self.state.orderbook_manager.write().await;
        let update = manager.replace_snapshot(&config.pool_name, snapshot);

        if let SnapshotUpdate::Replaced { version } = update {
            if let Some(state) = manager.get_state(&config.pool_name) {
                drop(manager);
                telemetry::record_snapshot(&state);
                debug!(pool = %state.pool_name, version, "Order book replaced");
            }
        }

        Ok(update)
    }

    /// Fetch the market summary and swap it in
    pub async fn poll_summary(&self) -> Result<()> {
        let summary = self.client.fetch_summary().await?;
        *self.state.summaries.write().await = summary;
        Ok(())
    }

    /// Fetch recent trades for the configured pool and swap them in
    pub async fn poll_trades(&self) -> Result<()> {
        let config = &self.state.config;
        let trades = self
            .client
            .fetch_trades(&config.pool_name, config.trades_limit)
            .await?;
        self.state
            .trades
            .write()
            .await
            .insert(config.pool_name.clone(), trades);
        Ok(())
    }

    fn backoff(&self, feed: Feed) -> &Backoff {
        match feed {
            Feed::Orderbook => &self.orderbook_backoff,
            Feed::Summary => &self.summary_backoff,
            Feed::Trades => &self.trades_backoff,
        }
    }

    fn backoff_mut(&mut self, feed: Feed) -> &mut Backoff {
        match feed {
            Feed::Orderbook => &mut self.orderbook_backoff,
            Feed::Summary => &mut self.summary_backoff,
            Feed::Trades => &mut self.trades_backoff,
        }
    }

    async fn refresh_pools_if_stale(&self) -> Result<()> {
        if !self.state.pools.read().await.is_stale() {
            return Ok(());
        }

        let pools = self.client.fetch_pools().await?;
        let count = pools.len();
        self.state.pools.write().await.replace(pools);
        info!(pools = count, "Pool registry refreshed");
        Ok(())
    }

    async fn log_status(&self) {
        let manager = self.state.orderbook_manager.read().await;
        for pool_name in manager.pool_names() {
            if let Some(state) = manager.get_state(&pool_name) {
                info!(
                    pool = %pool_name,
                    version = state.version,
                    mid_price = ?state.metrics.mid_price,
                    spread = ?state.metrics.spread.map(|s| s.amount),
                    crossed = state.metrics.crossed,
                    anomalies = state.metrics.anomalies,
                    "Order book status"
                );
            }
        }
    }
}

/// Exponential backoff, capped at [`MAX_BACKOFF_MS`]
fn backoff_delay(base_delay_ms: u64, attempts: u32) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.pow(attempts.min(6)));
    Duration::from_millis(delay.min(MAX_BACKOFF_MS))
}
