//! Order book module
//!
//! Holds the latest indexer snapshot per pool and derives display-ready depth
//! from it. Snapshots are replaced wholesale; there is no incremental path.

mod book;
pub mod depth;
mod manager;
mod metrics;
pub mod spread;

pub use book::{OrderBook, SnapshotUpdate};
pub use depth::{aggregate, AggregatedLevel, DepthRow, DepthView, SideDepth, SnapshotAnomaly};
pub use manager::OrderBookManager;
pub use metrics::OrderBookMetrics;
pub use spread::{compute_spread, mid_price, Spread};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Whether `next` correctly follows `prev` in best-first order
    pub fn is_ordered(&self, prev: Decimal, next: Decimal) -> bool {
        match self {
            Side::Bid => next < prev,
            Side::Ask => next > prev,
        }
    }
}

/// Order book state to be served
#[derive(Debug, Clone, Serialize)]
pub struct OrderBookState {
    pub pool_name: String,
    pub version: u64,
    pub received_at: Option<DateTime<Utc>>,
    pub metrics: OrderBookMetrics,
    pub view: Arc<DepthView>,
}
