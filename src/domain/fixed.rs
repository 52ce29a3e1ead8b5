//! Fixed-point numeric kernel.
//!
//! All amounts crossing the ledger boundary are scaled integers:
//! share/price-model values at 18-decimal scale ("wad", `i128`) and
//! settlement-currency values at 6-decimal scale ("usdc", `i64`).
//! This module owns every conversion between the two scales and the
//! transcendental evaluations (`exp`, `ln`) the cost model needs.
//!
//! `exp`/`ln` run through `f64` internally and round half-away-from-zero
//! back to wad. The ledger's on-chain evaluation is the source of truth
//! for settlement; the kernel is a prediction of it, accurate to a
//! relative error well under 1e-9 over the supported domain — far below
//! slippage granularity (1 bps). Out-of-domain inputs fail with a typed
//! error, never a silent clamp.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 18-decimal fixed-point scale for shares, prices, and the cost model.
pub const WAD: i128 = 1_000_000_000_000_000_000;

/// 6-decimal fixed-point scale for settlement-currency amounts.
pub const USDC_SCALE: i64 = 1_000_000;

/// Wad units per usdc unit (18 − 6 decimal places).
pub const USDC_TO_WAD: i128 = 1_000_000_000_000;

/// Basis-point denominator.
pub const BPS_DENOM: i128 = 10_000;

/// Largest wad magnitude the kernel accepts, in whole units.
///
/// `i128::MAX` is ~1.7e38, i.e. ~1.7e20 whole units at 18 decimals.
/// 1e20 leaves headroom for intermediate rounding.
const MAX_WAD_UNITS: f64 = 1e20;

/// Errors from scaled-integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum NumericError {
    /// Result does not fit in the wad domain.
    #[error("numeric overflow in fixed-point operation")]
    Overflow,
    /// Input outside the mathematical domain (e.g. ln of non-positive).
    #[error("domain error in fixed-point operation")]
    Domain,
}

/// Convert a wad integer to its `f64` unit value.
#[inline]
pub fn from_wad(x: i128) -> f64 {
    x as f64 / WAD as f64
}

/// Convert an `f64` unit value to wad, rounding half-away-from-zero.
///
/// # Errors
/// `Overflow` if the value is non-finite or outside the wad domain.
#[inline]
pub fn to_wad(x: f64) -> Result<i128, NumericError> {
    if !x.is_finite() || x.abs() > MAX_WAD_UNITS {
        return Err(NumericError::Overflow);
    }
    let scaled = x * WAD as f64;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5).floor()
    } else {
        (scaled - 0.5).ceil()
    };
    Ok(rounded as i128)
}

/// Widen a 6-decimal settlement amount to 18-decimal wad. Exact.
#[inline]
pub fn usdc_to_wad(x: i64) -> i128 {
    i128::from(x) * USDC_TO_WAD
}

/// Narrow a wad amount to 6-decimal settlement units, truncating
/// toward zero. The discarded dust stays with the pool, matching the
/// ledger's own truncation.
#[inline]
pub fn wad_to_usdc(x: i128) -> Result<i64, NumericError> {
    i64::try_from(x / USDC_TO_WAD).map_err(|_| NumericError::Overflow)
}

/// Checked `a * b / denom` with truncation toward zero.
///
/// Intended for bps-range multipliers (slippage floors, chunk caps)
/// where `a * b` stays inside `i128`; wider products are an `Overflow`.
#[inline]
pub fn mul_div(a: i128, b: i128, denom: i128) -> Result<i128, NumericError> {
    if denom == 0 {
        return Err(NumericError::Domain);
    }
    a.checked_mul(b)
        .map(|p| p / denom)
        .ok_or(NumericError::Overflow)
}

/// Basis-point fraction of a settlement amount, truncated toward zero
/// at the 6-decimal scale. Used per fee bucket so each bucket rounds
/// independently, as the ledger does.
#[inline]
pub fn apply_bps(amount: i64, bps: u16) -> i64 {
    ((i128::from(amount) * i128::from(bps)) / BPS_DENOM) as i64
}

/// `exp` over wad fixed point: `exp_wad(x) ≈ e^(x/1e18) · 1e18`.
///
/// # Errors
/// `Overflow` when the result leaves the wad domain (argument above
/// ~46 units) or the input is otherwise unrepresentable.
pub fn exp_wad(x: i128) -> Result<i128, NumericError> {
    let arg = from_wad(x);
    let value = arg.exp();
    to_wad(value)
}

/// Natural log over wad fixed point: `ln_wad(x) ≈ ln(x/1e18) · 1e18`.
///
/// # Errors
/// `Domain` for non-positive input.
pub fn ln_wad(x: i128) -> Result<i128, NumericError> {
    if x <= 0 {
        return Err(NumericError::Domain);
    }
    let value = from_wad(x).ln();
    to_wad(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wad_round_trip() {
        let x = 123_456_789_000_000_000_000i128; // 123.456789
        let back = to_wad(from_wad(x)).unwrap();
        // f64 carries ~15-16 significant digits; sub-1e6-wei drift allowed
        assert!((back - x).abs() < 1_000_000, "drift {}", back - x);
    }

    #[test]
    fn test_to_wad_rejects_non_finite() {
        assert_eq!(to_wad(f64::NAN), Err(NumericError::Overflow));
        assert_eq!(to_wad(f64::INFINITY), Err(NumericError::Overflow));
    }

    #[test]
    fn test_to_wad_rounds_half_away_from_zero() {
        assert_eq!(to_wad(1.5e-18).unwrap(), 2);
        assert_eq!(to_wad(-1.5e-18).unwrap(), -2);
    }

    #[test]
    fn test_usdc_wad_conversions_exact() {
        let usdc = 100 * USDC_SCALE; // 100 units
        assert_eq!(usdc_to_wad(usdc), 100 * WAD);
        assert_eq!(wad_to_usdc(100 * WAD).unwrap(), usdc);
    }

    #[test]
    fn test_wad_to_usdc_truncates_toward_zero() {
        // 1.9999999 usdc-units worth of wad dust truncates to 1.999999
        let wad = 1_999_999_900_000_000_000i128;
        assert_eq!(wad_to_usdc(wad).unwrap(), 1_999_999);
    }

    #[test]
    fn test_mul_div_truncates() {
        assert_eq!(mul_div(130, 9_800, 10_000).unwrap(), 127);
        assert_eq!(mul_div(1, 1, 0), Err(NumericError::Domain));
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(mul_div(i128::MAX, 2, 1), Err(NumericError::Overflow));
    }

    #[test]
    fn test_apply_bps_truncates_per_bucket() {
        // 1 usdc-wei at 9999 bps still truncates to zero
        assert_eq!(apply_bps(1, 9_999), 0);
        assert_eq!(apply_bps(100 * USDC_SCALE, 150), 1_500_000); // 1.5 units
    }

    #[test]
    fn test_exp_wad_zero_is_one() {
        assert_eq!(exp_wad(0).unwrap(), WAD);
    }

    #[test]
    fn test_exp_wad_one() {
        let e = exp_wad(WAD).unwrap();
        let expected = to_wad(std::f64::consts::E).unwrap();
        assert!((e - expected).abs() < 1_000_000);
    }

    #[test]
    fn test_exp_wad_overflow() {
        // e^50 ≈ 5.2e21 units > MAX_WAD_UNITS
        assert_eq!(exp_wad(50 * WAD), Err(NumericError::Overflow));
    }

    #[test]
    fn test_ln_wad_domain() {
        assert_eq!(ln_wad(0), Err(NumericError::Domain));
        assert_eq!(ln_wad(-WAD), Err(NumericError::Domain));
    }

    #[test]
    fn test_ln_exp_inverse() {
        let x = 3 * WAD;
        let back = ln_wad(exp_wad(x).unwrap()).unwrap();
        assert!((back - x).abs() < 1_000_000, "drift {}", back - x);
    }
}
