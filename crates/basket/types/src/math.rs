//! Checked integer fixed-point helpers.
//!
//! Every quantity in the engine is an unsigned integer in the asset's minor
//! units. Ratios are expressed in basis points. Results round toward zero,
//! which always favours the basket over the caller.

use crate::error::MathError;

/// Quantity of an asset or of claim tokens, in minor units.
pub type Amount = u128;

/// Basis points (1/100 of a percent).
pub type Bps = u16;

/// One whole expressed in basis points.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// `a * b / d`, rounded down. Fails rather than wrapping.
pub fn mul_div(a: Amount, b: Amount, d: Amount) -> Result<Amount, MathError> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    Ok(product / d)
}

/// `amount * bps / 10_000`, rounded down.
pub fn bps_of(amount: Amount, bps: Bps) -> Result<Amount, MathError> {
    mul_div(amount, bps as u128, BPS_DENOMINATOR)
}

/// Minimum acceptable output for a quoted amount under a slippage buffer.
pub fn apply_slippage(quoted: Amount, buffer_bps: Bps) -> Result<Amount, MathError> {
    let keep = BPS_DENOMINATOR
        .checked_sub(buffer_bps as u128)
        .ok_or(MathError::Underflow)?;
    mul_div(quoted, keep, BPS_DENOMINATOR)
}

pub fn checked_add(a: Amount, b: Amount) -> Result<Amount, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

pub fn checked_sub(a: Amount, b: Amount) -> Result<Amount, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

/// Sum a sequence of amounts, failing on overflow.
pub fn checked_sum<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> Result<Amount, MathError> {
    amounts
        .into_iter()
        .try_fold(0u128, |acc, amount| checked_add(acc, *amount))
}
