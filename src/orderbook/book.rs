//! Latest order book snapshot for one pool
//!
//! The snapshot and its depth view are immutable and shared through `Arc`.
//! A new snapshot replaces both in one step, so readers never see a view
//! built from a different snapshot than the one next to it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::spread::{compute_spread, mid_price, Spread};
use super::{DepthView, OrderBookMetrics, OrderBookState};
use crate::error::Result;
use crate::parser::{OrderBookSnapshot, PriceLevel};

/// Outcome of offering a new snapshot to the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotUpdate {
    /// Levels differ from the current snapshot; the view was rebuilt
    Replaced { version: u64 },
    /// Levels match the current snapshot; nothing was recomputed
    Unchanged { version: u64 },
}

impl SnapshotUpdate {
    pub fn version(&self) -> u64 {
        match self {
            SnapshotUpdate::Replaced { version } | SnapshotUpdate::Unchanged { version } => {
                *version
            }
        }
    }
}

/// Order book for a single pool
#[derive(Debug)]
pub struct OrderBook {
    pool_name: String,
    snapshot: Arc<OrderBookSnapshot>,
    view: Arc<DepthView>,
    /// Incremented on every replacement
    version: u64,
    received_at: Option<DateTime<Utc>>,
    /// Maximum depth levels kept per side
    max_depth: usize,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new(pool_name: &str, max_depth: usize) -> Self {
        Self {
            pool_name: pool_name.to_string(),
            snapshot: Arc::new(OrderBookSnapshot::default()),
            view: Arc::new(DepthView::empty()),
            version: 0,
            received_at: None,
            max_depth,
        }
    }

    /// Replace the current snapshot.
    ///
    /// The depth view is rebuilt only when the levels actually changed.
    pub fn replace_snapshot(&mut self, mut snapshot: OrderBookSnapshot) -> SnapshotUpdate {
        snapshot.truncate(self.max_depth);
        self.received_at = Some(Utc::now());

        if self.version > 0 && snapshot.same_levels(&self.snapshot) {
            return SnapshotUpdate::Unchanged {
                version: self.version,
            };
        }

        self.view = Arc::new(DepthView::build(&snapshot));
        self.snapshot = Arc::new(snapshot);
        self.version += 1;

        SnapshotUpdate::Replaced {
            version: self.version,
        }
    }

    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    pub fn snapshot(&self) -> Arc<OrderBookSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Depth view for the current snapshot
    pub fn depth_view(&self) -> Arc<DepthView> {
        Arc::clone(&self.view)
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.snapshot.best_bid()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.snapshot.best_ask()
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        mid_price(
            self.best_bid().map(|level| level.price),
            self.best_ask().map(|level| level.price),
        )
    }

    pub fn spread(&self) -> Result<Spread> {
        compute_spread(
            self.best_bid().map(|level| level.price),
            self.best_ask().map(|level| level.price),
        )
    }

    /// Check if the book has received a snapshot
    pub fn is_initialized(&self) -> bool {
        self.version > 0
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get current state for serving
    pub fn state(&self) -> OrderBookState {
        OrderBookState {
            pool_name: self.pool_name.clone(),
            version: self.version,
            received_at: self.received_at,
            metrics: self.calculate_metrics(),
            view: self.depth_view(),
        }
    }

    fn calculate_metrics(&self) -> OrderBookMetrics {
        OrderBookMetrics {
            mid_price: self.mid_price(),
            spread: self.view.spread,
            crossed: self.view.spread.is_some_and(|s| s.is_crossed()),
            bid_depth: total_quantity(&self.snapshot.bids),
            ask_depth: total_quantity(&self.snapshot.asks),
            bid_levels: self.snapshot.bids.len(),
            ask_levels: self.snapshot.asks.len(),
            anomalies: self.view.anomalies.len(),
        }
    }
}

fn total_quantity(levels: &[PriceLevel]) -> Decimal {
    levels
        .iter()
        .fold(Decimal::ZERO, |total, level| total.saturating_add(level.quantity))
}
