//! DeepBook Market Engine
//!
//! Turns DeepBook indexer snapshots into display-ready depth, rounds prices
//! and quantities to a pool's tick/lot grid, and sizes orders from balances.
//! The computation core (`orderbook`, `rounding`, `pool`, `order`) is pure
//! and synchronous; `indexer` polls the REST API and swaps snapshots in.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod config;
pub mod error;
pub mod indexer;
pub mod order;
pub mod orderbook;
pub mod parser;
pub mod pool;
pub mod rounding;
pub mod telemetry;

pub use crate::config::Config;
pub use crate::error::{EngineError, Result};
pub use crate::indexer::{IndexerClient, MarketPoller};
pub use crate::order::{size_order, Balance, FillPercent, OrderSide, OrderTicket, OrderType};
pub use crate::orderbook::{
    aggregate, compute_spread, AggregatedLevel, DepthView, OrderBook, OrderBookManager,
    OrderBookMetrics, OrderBookState, Side, Spread,
};
pub use crate::parser::{MarketSummary, OrderBookSnapshot, PriceLevel, Trade};
pub use crate::pool::{Market, Pool, PoolRegistry, Rounder};
pub use crate::rounding::round_to_place;

/// Application state shared across components
pub struct AppState {
    pub orderbook_manager: Arc<RwLock<OrderBookManager>>,
    pub pools: Arc<RwLock<PoolRegistry>>,
    pub summaries: Arc<RwLock<Vec<MarketSummary>>>,
    /// Recent trades per pool, newest first
    pub trades: Arc<RwLock<HashMap<String, Vec<Trade>>>>,
    pub config: Arc<Config>,
}
