//! Conversion between human decimal amounts and fixed-point base units.
//!
//! All engine arithmetic happens on `u128` base units (10^18 per whole value
//! unit). `rust_decimal` is only used at the edges: configuration input,
//! CLI output and log lines.

use rust_decimal::Decimal;

use crate::{CurveSaleError, Result, constants::VALUE_DECIMALS};

/// Convert a decimal value amount (e.g. `0.001`) into base units.
///
/// Exact: amounts with more than [`VALUE_DECIMALS`] fractional digits are
/// rejected rather than rounded.
pub fn parse_value(amount: Decimal) -> Result<u128> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CurveSaleError::InvalidConfig {
            reason: format!("negative amount {amount}"),
        });
    }
    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > VALUE_DECIMALS {
        return Err(CurveSaleError::InvalidConfig {
            reason: format!("{amount} has more than {VALUE_DECIMALS} decimal places"),
        });
    }
    let mantissa = u128::try_from(normalized.mantissa())
        .map_err(|_| CurveSaleError::overflow("parse_value"))?;
    10u128
        .checked_pow(VALUE_DECIMALS - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or(CurveSaleError::overflow("parse_value"))
}

/// Parse a decimal string (e.g. `"1.5"`) into base units.
pub fn parse_value_str(s: &str) -> Result<u128> {
    let amount: Decimal = s.trim().parse().map_err(|e| CurveSaleError::InvalidConfig {
        reason: format!("amount {s:?}: {e}"),
    })?;
    parse_value(amount)
}

/// Render base units as a normalized decimal (e.g. `996600000000000000` → `0.9966`).
pub fn format_value(base_units: u128) -> Result<Decimal> {
    let signed = i128::try_from(base_units).map_err(|_| CurveSaleError::overflow("format_value"))?;
    Decimal::try_from_i128_with_scale(signed, VALUE_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| CurveSaleError::overflow("format_value"))
}
