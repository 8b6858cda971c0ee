//! Order entry: sizing from balance, validation and on-chain encoding

pub mod sizing;
pub mod ticket;

pub use sizing::{size_order, SellRounding, SizingPolicy};
pub use ticket::{EncodedOrder, OrderTicket, PricePreset, ValidationIssue};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn is_bid(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

/// Share of the available balance offered by the 25% / 50% / MAX buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPercent {
    Quarter,
    Half,
    Max,
}

impl FillPercent {
    pub fn fraction(&self) -> Decimal {
        match self {
            FillPercent::Quarter => Decimal::new(25, 2),
            FillPercent::Half => Decimal::new(5, 1),
            FillPercent::Max => Decimal::ONE,
        }
    }
}

/// Balances held in the balance manager, read-only here
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub base_asset_balance: Decimal,
    pub quote_asset_balance: Decimal,
}

impl Balance {
    pub fn new(base_asset_balance: Decimal, quote_asset_balance: Decimal) -> Self {
        Self {
            base_asset_balance,
            quote_asset_balance,
        }
    }
}
