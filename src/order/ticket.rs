//! Order ticket: price presets, form validation and on-chain encoding
//!
//! The ticket is what the order form holds between edits. Once it validates,
//! [`OrderTicket::encode`] produces the integer price and quantity handed to
//! the transaction builder.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use super::{Balance, OrderSide, OrderType};
use crate::error::{EngineError, Result};
use crate::parser::OrderBookSnapshot;
use crate::pool::Market;
use crate::rounding::pow10;

/// Reference prices offered next to the limit price field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePreset {
    Mid,
    Bid,
}

impl PricePreset {
    /// Preset price rounded to the pool's tick grid, if the reference exists
    pub fn resolve(
        &self,
        market: &Market,
        mid_price: Option<Decimal>,
        book: &OrderBookSnapshot,
    ) -> Result<Option<Decimal>> {
        let reference = match self {
            PricePreset::Mid => mid_price,
            PricePreset::Bid => book.best_bid().map(|level| level.price),
        };
        reference.map(|price| market.rounder().quote(price)).transpose()
    }
}

/// Problems that keep a ticket from being submitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Invalid limit price")]
    InvalidLimitPrice,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Insufficient {symbol} balance")]
    InsufficientQuote { symbol: String },

    #[error("Insufficient {symbol} balance")]
    InsufficientBase { symbol: String },

    #[error("Amount is below the minimum size of {min_size}")]
    BelowMinSize { min_size: Decimal },

    #[error("Amount must be a multiple of {lot_step}")]
    NotLotAligned { lot_step: Decimal },

    #[error("Price must be a multiple of {tick_step}")]
    NotTickAligned { tick_step: Decimal },
}

/// Integer order parameters as the pool contract expects them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedOrder {
    pub pool_id: String,
    pub client_order_id: u64,
    pub order_type: OrderType,
    pub is_bid: bool,
    /// Scaled price, absent for market orders
    pub price: Option<u64>,
    /// Quantity in base units
    pub quantity: u64,
}

/// Current contents of the order form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTicket {
    pub side: OrderSide,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
    pub amount: Option<Decimal>,
}

impl OrderTicket {
    pub fn new(side: OrderSide, order_type: OrderType) -> Self {
        Self {
            side,
            order_type,
            limit_price: None,
            amount: None,
        }
    }

    pub fn with_limit_price(mut self, price: Decimal) -> Self {
        self.limit_price = Some(price);
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Quote value of the order, rounded to the tick grid
    pub fn total(&self, market: &Market) -> Result<Option<Decimal>> {
        match (self.limit_price, self.amount) {
            (Some(price), Some(amount)) => {
                let total = price.checked_mul(amount).ok_or_else(|| {
                    EngineError::InvalidOrder(format!("total of {amount} at {price} overflows"))
                })?;
                market.rounder().quote(total).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Collect every issue with the ticket against the pool and balances
    pub fn validate(&self, market: &Market, balance: &Balance) -> Result<Vec<ValidationIssue>> {
        let pool = market.pool();
        let mut issues = Vec::new();

        let price = match self.order_type {
            OrderType::Limit => self.limit_price,
            OrderType::Market => None,
        };

        if let Some(price) = price {
            if price <= Decimal::ZERO {
                issues.push(ValidationIssue::InvalidLimitPrice);
            } else {
                let tick_step = market.tick_step()?;
                if !(price % tick_step).is_zero() {
                    issues.push(ValidationIssue::NotTickAligned { tick_step });
                }
            }
        }

        if let Some(amount) = self.amount {
            if amount <= Decimal::ZERO {
                issues.push(ValidationIssue::InvalidAmount);
            } else {
                let min_size = pool.min_size_decimal()?;
                if amount < min_size {
                    issues.push(ValidationIssue::BelowMinSize { min_size });
                }
                let lot_step = market.lot_step()?;
                if !(amount % lot_step).is_zero() {
                    issues.push(ValidationIssue::NotLotAligned { lot_step });
                }
            }

            match (self.side, price) {
                // a cost too large to represent exceeds any balance
                (OrderSide::Buy, Some(price))
                    if amount
                        .checked_mul(price)
                        .map_or(true, |cost| cost > balance.quote_asset_balance) =>
                {
                    issues.push(ValidationIssue::InsufficientQuote {
                        symbol: pool.quote_asset_symbol.clone(),
                    });
                }
                (OrderSide::Sell, _) if amount > balance.base_asset_balance => {
                    issues.push(ValidationIssue::InsufficientBase {
                        symbol: pool.base_asset_symbol.clone(),
                    });
                }
                _ => {}
            }
        }

        Ok(issues)
    }

    /// Submission needs an amount, a price for limit orders and no issues
    pub fn can_submit(&self, market: &Market, balance: &Balance) -> Result<bool> {
        let has_amount = self.amount.is_some_and(|a| !a.is_zero());
        let has_price = match self.order_type {
            OrderType::Limit => self.limit_price.is_some_and(|p| !p.is_zero()),
            OrderType::Market => true,
        };
        Ok(has_amount && has_price && self.validate(market, balance)?.is_empty())
    }

    /// Encode price and quantity into the pool's integer representation.
    ///
    /// `price = price * 10^scalar * 10^quote_decimals / 10^base_decimals` and
    /// `quantity = amount * 10^base_decimals`, each rounded to the nearest
    /// integer.
    pub fn encode(&self, market: &Market, client_order_id: u64) -> Result<EncodedOrder> {
        let pool = market.pool();
        let amount = self
            .amount
            .ok_or_else(|| EngineError::InvalidOrder("amount is required".to_string()))?;

        let scaled_amount = amount
            .checked_mul(pool.base_scale()?)
            .ok_or_else(|| EngineError::InvalidOrder(format!("amount {amount} overflows")))?;
        let quantity = to_units(scaled_amount, "quantity")?;

        let price = match self.order_type {
            OrderType::Market => None,
            OrderType::Limit => {
                let price = self.limit_price.ok_or_else(|| {
                    EngineError::InvalidOrder("limit price is required".to_string())
                })?;
                let scaled = price
                    .checked_mul(pow10(
                        market.price_scalar_exponent() + pool.quote_asset_decimals,
                    )?)
                    .ok_or_else(|| EngineError::InvalidOrder(format!("price {price} overflows")))?
                    / pool.base_scale()?;
                Some(to_units(scaled, "price")?)
            }
        };

        Ok(EncodedOrder {
            pool_id: pool.pool_id.clone(),
            client_order_id,
            order_type: self.order_type,
            is_bid: self.side.is_bid(),
            price,
            quantity,
        })
    }
}

fn to_units(value: Decimal, what: &str) -> Result<u64> {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    if rounded <= Decimal::ZERO {
        return Err(EngineError::InvalidOrder(format!(
            "{what} {value} must be positive"
        )));
    }
    rounded
        .to_u64()
        .ok_or_else(|| EngineError::InvalidOrder(format!("{what} {value} does not fit in u64")))
}
