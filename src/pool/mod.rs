//! Pool metadata and the tick/lot grid derived from it
//!
//! A [`Market`] binds a pool to the exchange's fixed-point price scalar and
//! carries the [`Rounder`] used by the order form.

mod registry;

pub use registry::PoolRegistry;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::rounding::{self, IntoDecimal, MAX_PRECISION};

/// DeepBook encodes prices with `FLOAT_SCALAR = 10^9`
pub const DEEPBOOK_PRICE_SCALAR_EXPONENT: u32 = 9;

/// Trading pair metadata as served by the pool registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub pool_id: String,
    pub pool_name: String,
    pub base_asset_id: String,
    pub base_asset_decimals: u32,
    pub base_asset_symbol: String,
    #[serde(default)]
    pub base_asset_name: String,
    pub quote_asset_id: String,
    pub quote_asset_decimals: u32,
    pub quote_asset_symbol: String,
    #[serde(default)]
    pub quote_asset_name: String,
    /// Minimum order size in base units
    pub min_size: u64,
    /// Quantity increment in base units
    pub lot_size: u64,
    /// Price increment in scaled price units
    pub tick_size: u64,
}

impl Pool {
    /// Derive the decimal places valid for base quantities and quote prices.
    ///
    /// `price_scalar_exponent` is `log10` of the exchange's fixed-point price
    /// scalar (9 on DeepBook).
    pub fn precision(&self, price_scalar_exponent: u32) -> Result<Precision> {
        let lot_exp = exact_log10(self.lot_size).ok_or_else(|| {
            EngineError::InvalidPool(format!(
                "{}: lot size {} is not a power of ten",
                self.pool_name, self.lot_size
            ))
        })?;
        let tick_exp = exact_log10(self.tick_size).ok_or_else(|| {
            EngineError::InvalidPool(format!(
                "{}: tick size {} is not a power of ten",
                self.pool_name, self.tick_size
            ))
        })?;

        let base = self.base_asset_decimals as i32 - lot_exp;
        let quote = price_scalar_exponent as i32 - tick_exp + self.quote_asset_decimals as i32
            - self.base_asset_decimals as i32;

        Precision::new(base, quote).map_err(|_| {
            EngineError::InvalidPool(format!(
                "{}: precisions base={base} quote={quote} are out of range",
                self.pool_name
            ))
        })
    }

    /// Scale factor between decimal base quantities and integer base units
    pub fn base_scale(&self) -> Result<Decimal> {
        rounding::pow10(self.base_asset_decimals)
    }

    /// Minimum order size expressed in base asset units
    pub fn min_size_decimal(&self) -> Result<Decimal> {
        Ok(Decimal::from(self.min_size) / self.base_scale()?)
    }
}

/// Decimal places valid for each kind of value in a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    pub base: i32,
    pub quote: i32,
    pub display: i32,
}

impl Precision {
    pub fn new(base: i32, quote: i32) -> Result<Self> {
        for p in [base, quote] {
            if p.abs() > MAX_PRECISION {
                return Err(EngineError::InvalidRoundingInput(format!(
                    "precision {p} is outside the decimal range"
                )));
            }
        }
        Ok(Self {
            base,
            quote,
            display: base.max(quote),
        })
    }
}

/// Rounding bound to a pool's precisions.
///
/// `quote` is for limit prices, `base` for order quantities and `display`
/// for balances shown to the user. Display rounding must never feed a value
/// submitted on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rounder {
    precision: Precision,
}

impl Rounder {
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    pub fn quote<V: IntoDecimal>(&self, value: V) -> Result<Decimal> {
        rounding::round_to_place(value, self.precision.quote)
    }

    pub fn base<V: IntoDecimal>(&self, value: V) -> Result<Decimal> {
        rounding::round_to_place(value, self.precision.base)
    }

    pub fn display<V: IntoDecimal>(&self, value: V) -> Result<Decimal> {
        rounding::round_to_place(value, self.precision.display)
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }
}

/// A pool together with the grid derived for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    pool: Pool,
    rounder: Rounder,
    price_scalar_exponent: u32,
}

impl Market {
    pub fn new(pool: Pool, price_scalar_exponent: u32) -> Result<Self> {
        let precision = pool.precision(price_scalar_exponent)?;
        Ok(Self {
            pool,
            rounder: Rounder::new(precision),
            price_scalar_exponent,
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn rounder(&self) -> &Rounder {
        &self.rounder
    }

    pub fn precision(&self) -> Precision {
        self.rounder.precision()
    }

    pub fn price_scalar_exponent(&self) -> u32 {
        self.price_scalar_exponent
    }

    /// Smallest quantity increment in base asset units
    pub fn lot_step(&self) -> Result<Decimal> {
        rounding::step(self.precision().base)
    }

    /// Smallest price increment in quote asset units
    pub fn tick_step(&self) -> Result<Decimal> {
        rounding::step(self.precision().quote)
    }
}

/// `log10(n)` when `n` is an exact power of ten
fn exact_log10(mut n: u64) -> Option<i32> {
    if n == 0 {
        return None;
    }
    let mut exp = 0;
    while n % 10 == 0 {
        n /= 10;
        exp += 1;
    }
    (n == 1).then_some(exp)
}
