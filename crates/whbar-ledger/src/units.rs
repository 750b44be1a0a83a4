//! Conversion between the native fine unit and the ledger's coarse unit.
//!
//! Amounts are [`U256`] end to end, so values above the 256-bit range cannot
//! be expressed and negative values cannot reach this layer. The one place a
//! conversion can leave the range is [`to_fine`], which is checked.

use crate::error::ValidationError;
use alloy_primitives::U256;

/// Decimal places of the native unit used at the calling boundary.
pub const FINE_DECIMALS: u8 = 18;

/// Decimal places of the unit balances are kept in.
pub const COARSE_DECIMALS: u8 = 8;

/// Fine units per coarse unit (10^10).
pub const COEF: U256 = U256::from_limbs([10_000_000_000, 0, 0, 0]);

/// Converts a fine amount to coarse units, truncating toward zero.
///
/// The discarded remainder ([`dust`]) stays in the contract's reserve without
/// crediting anyone.
pub fn to_coarse(fine: U256) -> U256 {
    fine / COEF
}

/// Converts a coarse amount to fine units.
///
/// `to_fine(to_coarse(x)) <= x` always holds, with the gap being `x % COEF`.
pub fn to_fine(coarse: U256) -> Result<U256, ValidationError> {
    coarse
        .checked_mul(COEF)
        .ok_or(ValidationError::FineAmountOverflow { coarse })
}

/// The part of a fine amount that [`to_coarse`] discards.
pub fn dust(fine: U256) -> U256 {
    fine % COEF
}

/// Converts a signed host integer into a ledger amount, rejecting negatives.
pub fn amount_from_i128(value: i128) -> Result<U256, ValidationError> {
    u128::try_from(value)
        .map(U256::from)
        .map_err(|_| ValidationError::NegativeAmount { value })
}
