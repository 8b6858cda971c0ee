//! Order book summary metrics

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Spread;

/// Computed metrics for an order book
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBookMetrics {
    /// Mid price (average of best bid and ask)
    pub mid_price: Option<Decimal>,

    /// Spread between best ask and best bid
    pub spread: Option<Spread>,

    /// Best ask below best bid
    pub crossed: bool,

    /// Total bid depth (volume)
    pub bid_depth: Decimal,

    /// Total ask depth (volume)
    pub ask_depth: Decimal,

    /// Number of bid levels
    pub bid_levels: usize,

    /// Number of ask levels
    pub ask_levels: usize,

    /// Number of data-quality anomalies in the snapshot
    pub anomalies: usize,
}

impl OrderBookMetrics {
    /// Check if the order book is healthy (has valid data)
    pub fn is_healthy(&self) -> bool {
        self.mid_price.is_some()
            && self.spread.is_some()
            && !self.crossed
            && self.anomalies == 0
            && self.bid_levels > 0
            && self.ask_levels > 0
    }
}
