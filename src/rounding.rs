//! Decimal-safe rounding to a fixed number of places
//!
//! A positive precision rounds to that many decimal places, zero rounds to an
//! integer and a negative precision rounds to a power of ten left of the
//! decimal point. All arithmetic happens on `Decimal`, so results carry no
//! binary floating point residue.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// Largest precision magnitude a `Decimal` can express
pub const MAX_PRECISION: i32 = 28;

const STRATEGY: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Conversion of user or wire input into a `Decimal` ready for rounding
pub trait IntoDecimal {
    fn into_decimal(self) -> Result<Decimal>;
}

impl IntoDecimal for Decimal {
    fn into_decimal(self) -> Result<Decimal> {
        Ok(self)
    }
}

impl IntoDecimal for &Decimal {
    fn into_decimal(self) -> Result<Decimal> {
        Ok(*self)
    }
}

impl IntoDecimal for f64 {
    fn into_decimal(self) -> Result<Decimal> {
        if !self.is_finite() {
            return Err(EngineError::InvalidRoundingInput(format!(
                "{self} is not a finite number"
            )));
        }
        Decimal::from_f64(self).ok_or_else(|| {
            EngineError::InvalidRoundingInput(format!("{self} is outside the decimal range"))
        })
    }
}

impl IntoDecimal for &str {
    fn into_decimal(self) -> Result<Decimal> {
        let trimmed = self.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|e| {
                EngineError::InvalidRoundingInput(format!("cannot parse {trimmed:?}: {e}"))
            })
    }
}

/// Round `value` to `precision` places.
///
/// Fails with [`EngineError::InvalidRoundingInput`] when the value is NaN or
/// infinite, cannot be parsed, or the precision is beyond what `Decimal` can
/// represent. The result is normalized, so `round_to_place(0.10000001, 4)`
/// yields exactly `0.1`.
pub fn round_to_place<V: IntoDecimal>(value: V, precision: i32) -> Result<Decimal> {
    let value = value.into_decimal()?;
    check_precision(precision)?;

    let rounded = if precision >= 0 {
        value.round_dp_with_strategy(precision.unsigned_abs(), STRATEGY)
    } else {
        let step = pow10(precision.unsigned_abs())?;
        let steps = value
            .checked_div(step)
            .ok_or_else(|| overflow(value, precision))?
            .round_dp_with_strategy(0, STRATEGY);
        steps
            .checked_mul(step)
            .ok_or_else(|| overflow(value, precision))?
    };

    Ok(rounded.normalize())
}

/// Round `value` down to a whole multiple of `10^-precision`.
pub fn floor_to_place<V: IntoDecimal>(value: V, precision: i32) -> Result<Decimal> {
    let value = value.into_decimal()?;
    let step = step(precision)?;
    let steps = value
        .checked_div(step)
        .ok_or_else(|| overflow(value, precision))?
        .floor();
    Ok(steps
        .checked_mul(step)
        .ok_or_else(|| overflow(value, precision))?
        .normalize())
}

/// The smallest increment representable at `precision`, i.e. `10^-precision`.
pub fn step(precision: i32) -> Result<Decimal> {
    check_precision(precision)?;
    if precision >= 0 {
        Ok(Decimal::new(1, precision.unsigned_abs()))
    } else {
        pow10(precision.unsigned_abs())
    }
}

/// `10^exponent` as an exact decimal.
pub fn pow10(exponent: u32) -> Result<Decimal> {
    if exponent > MAX_PRECISION.unsigned_abs() {
        return Err(EngineError::InvalidRoundingInput(format!(
            "10^{exponent} exceeds the decimal range"
        )));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(exponent), 0))
}

fn check_precision(precision: i32) -> Result<()> {
    if precision.abs() > MAX_PRECISION {
        return Err(EngineError::InvalidRoundingInput(format!(
            "precision {precision} is outside [-{MAX_PRECISION}, {MAX_PRECISION}]"
        )));
    }
    Ok(())
}

fn overflow(value: Decimal, precision: i32) -> EngineError {
    EngineError::InvalidRoundingInput(format!(
        "rounding {value} to precision {precision} overflows"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_precision() {
        assert_eq!(round_to_place(dec!(3.14159), 2).unwrap(), dec!(3.14));
        assert_eq!(round_to_place(dec!(3.145), 2).unwrap(), dec!(3.15));
        assert_eq!(round_to_place(1.23456789, 4).unwrap(), dec!(1.2346));
    }

    #[test]
    fn test_zero_precision() {
        assert_eq!(round_to_place(2.5, 0).unwrap(), dec!(3));
        assert_eq!(round_to_place(dec!(2.49), 0).unwrap(), dec!(2));
        assert_eq!(round_to_place(dec!(-2.5), 0).unwrap(), dec!(-3));
    }

    #[test]
    fn test_negative_precision() {
        assert_eq!(round_to_place(dec!(1234.5), -2).unwrap(), dec!(1200));
        assert_eq!(round_to_place(dec!(1250), -2).unwrap(), dec!(1300));
        assert_eq!(round_to_place(dec!(49), -2).unwrap(), dec!(0));
    }

    #[test]
    fn test_no_float_residue() {
        let rounded = round_to_place(0.1000000000000001, 4).unwrap();
        assert_eq!(rounded, dec!(0.1));
        assert_eq!(rounded.to_string(), "0.1");

        let rounded = round_to_place(0.1 + 0.2, 9).unwrap();
        assert_eq!(rounded.to_string(), "0.3");
    }

    #[test]
    fn test_non_finite_input_fails() {
        assert!(matches!(
            round_to_place(f64::NAN, 2),
            Err(EngineError::InvalidRoundingInput(_))
        ));
        assert!(matches!(
            round_to_place(f64::INFINITY, 2),
            Err(EngineError::InvalidRoundingInput(_))
        ));
        assert!(matches!(
            round_to_place(f64::NEG_INFINITY, -1),
            Err(EngineError::InvalidRoundingInput(_))
        ));
    }

    #[test]
    fn test_out_of_range_precision_fails() {
        assert!(round_to_place(dec!(1), 29).is_err());
        assert!(round_to_place(dec!(1), -29).is_err());
    }

    #[test]
    fn test_string_input() {
        assert_eq!(round_to_place("4.1234567", 3).unwrap(), dec!(4.123));
        assert_eq!(round_to_place(" 1e-3 ", 4).unwrap(), dec!(0.001));
        assert!(round_to_place("abc", 2).is_err());
    }

    #[test]
    fn test_rounding_is_idempotent() {
        let values = [
            dec!(0),
            dec!(0.5),
            dec!(1.005),
            dec!(-7.77777),
            dec!(123456.789),
            dec!(0.000123456),
            dec!(99999.99999),
            dec!(-0.045),
        ];
        for value in values {
            for precision in -4..=8 {
                let once = round_to_place(value, precision).unwrap();
                let twice = round_to_place(once, precision).unwrap();
                assert_eq!(once, twice, "value {value} precision {precision}");
            }
        }
    }

    #[test]
    fn test_floor_to_place() {
        assert_eq!(floor_to_place(dec!(32.9989), 2).unwrap(), dec!(32.99));
        assert_eq!(floor_to_place(dec!(1299), -2).unwrap(), dec!(1200));
        assert_eq!(floor_to_place(dec!(24.75), 2).unwrap(), dec!(24.75));
    }

    #[test]
    fn test_step() {
        assert_eq!(step(2).unwrap(), dec!(0.01));
        assert_eq!(step(0).unwrap(), dec!(1));
        assert_eq!(step(-3).unwrap(), dec!(1000));
    }
}
