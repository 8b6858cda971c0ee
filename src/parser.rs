//! Parser module for DeepBook indexer payloads
//!
//! Order book levels arrive as string-encoded decimals so no precision is
//! lost in transit.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Price level (price, quantity pair)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }

    /// Quote value resting at this level, `None` on overflow
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

/// Order book snapshot from `/orderbook/{pool}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderBookSnapshot {
    /// Indexer timestamp in milliseconds, when provided
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub timestamp: Option<u64>,

    /// Bids, best (highest) first
    #[serde(deserialize_with = "deserialize_price_levels")]
    pub bids: Vec<PriceLevel>,

    /// Asks, best (lowest) first
    #[serde(deserialize_with = "deserialize_price_levels")]
    pub asks: Vec<PriceLevel>,
}

impl OrderBookSnapshot {
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Keep at most `depth` levels per side
    pub fn truncate(&mut self, depth: usize) {
        self.bids.truncate(depth);
        self.asks.truncate(depth);
    }

    /// Same levels on both sides, ignoring the timestamp
    pub fn same_levels(&self, other: &Self) -> bool {
        self.bids == other.bids && self.asks == other.asks
    }
}

/// Row of the indexer `/summary` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub trading_pairs: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub last_price: Decimal,
    pub lowest_ask: Decimal,
    pub highest_bid: Decimal,
    pub base_volume: Decimal,
    pub quote_volume: Decimal,
    pub lowest_price_24h: Decimal,
    pub highest_price_24h: Decimal,
    pub price_change_percent_24h: Decimal,
}

/// Fill from the indexer `/trades/{pool}` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: String,
    pub maker_order_id: String,
    pub taker_order_id: String,
    #[serde(default)]
    pub maker_balance_manager_id: String,
    #[serde(default)]
    pub taker_balance_manager_id: String,
    /// Taker side, "buy" or "sell"
    #[serde(rename = "type")]
    pub trade_type: String,
    pub price: Decimal,
    pub base_volume: Decimal,
    pub quote_volume: Decimal,
    /// Milliseconds since the epoch
    pub timestamp: u64,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        self.trade_type.eq_ignore_ascii_case("buy")
    }
}

/// Parse an order book snapshot payload
pub fn parse_orderbook(raw: &str) -> Result<OrderBookSnapshot, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Custom deserializer for price levels from array of string pairs
fn deserialize_price_levels<'de, D>(deserializer: D) -> Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<String>> = Deserialize::deserialize(deserializer)?;
    raw.into_iter()
        .map(|pair| {
            if pair.len() != 2 {
                return Err(serde::de::Error::custom("Invalid price level format"));
            }
            Ok(PriceLevel {
                price: Decimal::from_str(&pair[0]).map_err(serde::de::Error::custom)?,
                quantity: Decimal::from_str(&pair[1]).map_err(serde::de::Error::custom)?,
            })
        })
        .collect()
}

/// The indexer sends timestamps either as a number or a numeric string
fn deserialize_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
