//! Order quantity from a share of the available balance
//!
//! Buys spend quote: the budget is cut by a haircut for fee and rounding
//! slack, converted to base units and floored to whole lots. Sells size from
//! the base balance and round to the nearest lot by default, which can land
//! one lot above the balance. [`SellRounding::Floor`] never exceeds it.

use rust_decimal::Decimal;
use tracing::debug;

use super::{Balance, FillPercent, OrderSide};
use crate::error::{EngineError, Result};
use crate::pool::Market;
use crate::rounding::floor_to_place;

/// Default buy haircut: spend at most 99% of the requested budget
pub const DEFAULT_BUY_HAIRCUT: Decimal = Decimal::from_parts(99, 0, 0, false, 2);

/// Rounding applied to sell quantities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SellRounding {
    /// Nearest lot, as the order form has always done
    #[default]
    Nearest,
    /// Whole lots only, never above the base balance
    Floor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingPolicy {
    pub buy_haircut: Decimal,
    pub sell_rounding: SellRounding,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            buy_haircut: DEFAULT_BUY_HAIRCUT,
            sell_rounding: SellRounding::Nearest,
        }
    }
}

/// Base quantity for a share of the balance.
///
/// A buy without a positive limit price sizes to zero: the user simply has
/// not entered a price yet. The result is never negative.
pub fn size_order(
    percent: FillPercent,
    side: OrderSide,
    limit_price: Option<Decimal>,
    balance: &Balance,
    market: &Market,
    policy: &SizingPolicy,
) -> Result<Decimal> {
    let quantity = match side {
        OrderSide::Buy => {
            let Some(price) = limit_price.filter(|p| *p > Decimal::ZERO) else {
                debug!("No limit price, buy size defaults to zero");
                return Ok(Decimal::ZERO);
            };
            let budget = percent
                .fraction()
                .checked_mul(balance.quote_asset_balance)
                .and_then(|budget| budget.checked_mul(policy.buy_haircut))
                .ok_or_else(|| {
                    EngineError::InvalidOrder(format!(
                        "budget from {} overflows",
                        balance.quote_asset_balance
                    ))
                })?;
            let raw = budget.checked_div(price).ok_or_else(|| {
                EngineError::InvalidOrder(format!("budget {budget} at price {price} overflows"))
            })?;
            floor_to_lot(raw, market)?
        }
        OrderSide::Sell => {
            let raw = percent.fraction() * balance.base_asset_balance;
            match policy.sell_rounding {
                SellRounding::Nearest => market.rounder().base(raw)?,
                SellRounding::Floor => floor_to_place(raw, market.precision().base)?,
            }
        }
    };

    Ok(quantity.max(Decimal::ZERO).normalize())
}

/// Floor a decimal base quantity to whole lots via integer base units
fn floor_to_lot(quantity: Decimal, market: &Market) -> Result<Decimal> {
    let scale = market.pool().base_scale()?;
    let lot = Decimal::from(market.pool().lot_size);

    let units = quantity
        .checked_mul(scale)
        .ok_or_else(|| EngineError::InvalidOrder(format!("quantity {quantity} overflows")))?
        .floor();
    let lots = (units / lot).floor();

    Ok(lots * lot / scale)
}
