//! Exact money arithmetic.
//!
//! Amounts and fees arrive as decimal SBIT (`rust_decimal::Decimal`) and are
//! converted to integer base units exactly once, right before they are
//! compared against UTXO values or written into outputs. No floating point
//! is involved anywhere on this path.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use crate::constants::{COIN, COIN_DECIMALS};
use crate::error::AmountError;

/// Convert a decimal SBIT amount to base units.
///
/// Fails on negative input, on more than eight fractional digits, and on
/// values that do not fit a `u64`.
pub fn to_base_units(amount: Decimal) -> Result<u64, AmountError> {
    if amount < Decimal::ZERO {
        return Err(AmountError::Negative(amount.to_string()));
    }
    let scaled = amount
        .checked_mul(Decimal::from(COIN))
        .ok_or_else(|| AmountError::Overflow(amount.to_string()))?;
    if !scaled.fract().is_zero() {
        return Err(AmountError::TooPrecise(amount.to_string()));
    }
    scaled
        .to_u64()
        .ok_or_else(|| AmountError::Overflow(amount.to_string()))
}

/// Convert base units back to a decimal SBIT amount.
pub fn from_base_units(units: u64) -> Decimal {
    Decimal::from_i128_with_scale(units as i128, COIN_DECIMALS)
}

/// Gas cost in SBIT: `gas_limit * gas_price / 10^8`, with the gas price in
/// base units per gas.
pub fn gas_fee(gas_limit: u64, gas_price: u64) -> Result<Decimal, AmountError> {
    Decimal::from(gas_limit)
        .checked_mul(Decimal::from(gas_price))
        .and_then(|v| v.checked_div(Decimal::from(COIN)))
        .ok_or_else(|| AmountError::Overflow(format!("gas {gas_limit} x {gas_price}")))
}

/// Parse a user-supplied SBIT amount such as `"4"` or `"0.01"`.
///
/// Rejects anything that cannot be represented exactly.
pub fn parse_amount(s: &str) -> Result<Decimal, AmountError> {
    let amount = Decimal::from_str_exact(s.trim()).map_err(|e| AmountError::Parse {
        input: s.to_string(),
        reason: e.to_string(),
    })?;
    // Validate range and precision up front.
    to_base_units(amount)?;
    Ok(amount)
}

/// Parse an amount already expressed in base units.
pub fn parse_base_units(s: &str) -> Result<u64, AmountError> {
    u64::from_str(s.trim()).map_err(|e| AmountError::Parse {
        input: s.to_string(),
        reason: e.to_string(),
    })
}
