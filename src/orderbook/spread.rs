//! Spread and mid price between the best bid and best ask

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, Result};

/// Gap between the best ask and the best bid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spread {
    /// `best_ask - best_bid`; negative when the book is crossed
    pub amount: Decimal,
    /// `amount / best_bid * 100`
    pub percent: Decimal,
}

impl Spread {
    pub fn is_crossed(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

/// Compute the spread from the best prices on each side.
///
/// A missing side or a non-positive best bid is a malformed snapshot. A
/// crossed book is returned as-is (negative amount) and logged.
pub fn compute_spread(best_bid: Option<Decimal>, best_ask: Option<Decimal>) -> Result<Spread> {
    let (bid, ask) = match (best_bid, best_ask) {
        (Some(bid), Some(ask)) => (bid, ask),
        (None, None) => {
            return Err(EngineError::MalformedSnapshot(
                "both sides of the book are empty".to_string(),
            ))
        }
        (None, _) => {
            return Err(EngineError::MalformedSnapshot(
                "bid side is empty".to_string(),
            ))
        }
        (_, None) => {
            return Err(EngineError::MalformedSnapshot(
                "ask side is empty".to_string(),
            ))
        }
    };

    if bid <= Decimal::ZERO {
        return Err(EngineError::MalformedSnapshot(format!(
            "best bid {bid} is not positive"
        )));
    }

    let overflow =
        || EngineError::MalformedSnapshot(format!("spread between {bid} and {ask} overflows"));
    let amount = ask.checked_sub(bid).ok_or_else(overflow)?;
    let percent = amount
        .checked_div(bid)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;
    let spread = Spread { amount, percent };

    if spread.is_crossed() {
        warn!(best_bid = %bid, best_ask = %ask, spread = %amount, "Crossed order book");
    }

    Ok(spread)
}

/// Average of best bid and best ask, `None` when it cannot be represented
pub fn mid_price(best_bid: Option<Decimal>, best_ask: Option<Decimal>) -> Option<Decimal> {
    match (best_bid, best_ask) {
        (Some(bid), Some(ask)) => bid
            .checked_add(ask)
            .map(|sum| sum / Decimal::TWO)
            .or_else(|| (bid / Decimal::TWO).checked_add(ask / Decimal::TWO)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_spread() {
        let spread = compute_spread(Some(dec!(4.10)), Some(dec!(4.12))).unwrap();
        assert_eq!(spread.amount, dec!(0.02));
        assert_eq!(spread.percent.round_dp(4), dec!(0.4878));
        assert!(!spread.is_crossed());
    }

    #[test]
    fn test_crossed_book_keeps_raw_spread() {
        let spread = compute_spread(Some(dec!(4.12)), Some(dec!(4.10))).unwrap();
        assert_eq!(spread.amount, dec!(-0.02));
        assert!(spread.percent < Decimal::ZERO);
        assert!(spread.is_crossed());
    }

    #[test]
    fn test_empty_side_is_malformed() {
        assert!(matches!(
            compute_spread(None, Some(dec!(1))),
            Err(EngineError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            compute_spread(Some(dec!(1)), None),
            Err(EngineError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            compute_spread(None, None),
            Err(EngineError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_zero_bid_is_malformed() {
        assert!(compute_spread(Some(Decimal::ZERO), Some(dec!(1))).is_err());
    }

    #[test]
    fn test_spread_overflow_is_malformed() {
        assert!(matches!(
            compute_spread(Some(dec!(0.0000001)), Some(Decimal::MAX)),
            Err(EngineError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            compute_spread(Some(Decimal::MAX), Some(Decimal::MIN)),
            Err(EngineError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn test_mid_price() {
        assert_eq!(mid_price(Some(dec!(4.10)), Some(dec!(4.12))), Some(dec!(4.11)));
        assert_eq!(mid_price(None, Some(dec!(4.12))), None);
        assert!(mid_price(Some(Decimal::MAX), Some(dec!(1))).is_some());
    }
}
