//! Fixed-point helpers shared by the allocation math and the rebalance logs.
//!
//! Shares are `I256` values where `FIXED_POINT_SCALE` (10^18) is 1.0. Every
//! division truncates toward zero, including for negative numerators.

use crate::utils::constants::{FIXED_POINT_SCALE, ONE_HUNDRED};
use alloy_primitives::utils::{UnitsError, parse_ether};
use alloy_primitives::{I256, U256};

/// `numerator / denominator` as a fixed-point fraction. Zero when the denominator is zero.
pub fn share_of(numerator: I256, denominator: U256) -> I256 {
    if denominator.is_zero() {
        return I256::ZERO;
    }
    let magnitude = numerator.unsigned_abs() * FIXED_POINT_SCALE / denominator;
    with_sign(magnitude, numerator.is_negative())
}

/// `share * amount`, truncated toward zero.
pub fn apply_share(share: I256, amount: U256) -> I256 {
    let magnitude = share.unsigned_abs() * amount / FIXED_POINT_SCALE;
    with_sign(magnitude, share.is_negative())
}

fn with_sign(magnitude: U256, negative: bool) -> I256 {
    let value = I256::try_from(magnitude).unwrap_or(I256::MAX);
    if negative { -value } else { value }
}

/// Percentage string as written in the inventory config ("7" means 7%) to a fixed-point fraction.
pub fn parse_pct(value: &str) -> Result<U256, UnitsError> {
    Ok(parse_ether(value.trim())? / ONE_HUNDRED)
}

/// Render a raw token amount in human units with two truncated decimals ("17.79").
pub fn format_amount(value: U256, decimals: u8) -> String {
    let exp = U256::from(10).pow(U256::from(decimals));
    let (whole, rem) = value.div_rem(exp);
    let cents = u64::try_from(rem * ONE_HUNDRED / exp).unwrap_or_default();
    format!("{whole}.{cents:02}")
}

/// Render a fixed-point fraction as a percentage with two truncated decimals ("7.00%").
pub fn format_pct(share: I256) -> String {
    let formatted = format_amount(share.unsigned_abs() * ONE_HUNDRED, 18);
    if share.is_negative() { format!("-{formatted}%") } else { format!("{formatted}%") }
}
