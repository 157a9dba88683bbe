//! Fixed-point helpers for deterministic progress reporting.
//!
//! Cost amortization is pure integer math. Fixed-point values are only
//! produced for progress fractions handed to observers, so that reports are
//! bit-identical across platforms.

use fixed::types::I32F32;

/// Fixed-point number type for reported fractions.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Compute `part / whole` as a fixed-point fraction.
///
/// Returns zero when `whole` is zero and saturates at one when `part`
/// exceeds `whole`.
#[must_use]
pub fn fraction(part: u64, whole: u64) -> Fixed {
    if whole == 0 {
        return Fixed::ZERO;
    }
    let part = part.min(whole);
    let bits = (i128::from(part) << 32) / i128::from(whole);
    // part <= whole, so bits <= 1 << 32 and fits in i64.
    Fixed::from_bits(i64::try_from(bits).unwrap_or(i64::MAX))
}
