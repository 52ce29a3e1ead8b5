//! Logarithmic Market Scoring Rule (LMSR) cost and price model.
//!
//! The LMSR is the pricing rule for binary outcome markets:
//! `C(q) = b · ln(exp(q_yes/b) + exp(q_no/b))`.
//! Reference: Hanson (2003) "Combinatorial Information Market Design".
//!
//! Evaluation is stabilized by factoring out the larger exponent
//! (log-sum-exp), so cost and price stay defined for any non-negative
//! quantities, however large relative to `b`. All quantities, costs,
//! and prices are 18-decimal wad integers (see `domain::fixed`).

use super::fixed::{from_wad, to_wad, NumericError, WAD};
use super::market::Side;

/// LMSR model for one market, parameterized by the depth parameter `b`.
///
/// Higher `b` means deeper liquidity: slower price movement per share.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    /// Liquidity parameter (wad, > 0).
    b: i128,
}

impl CostModel {
    /// Create a model with the given liquidity parameter.
    ///
    /// # Errors
    /// `Domain` if `b` is not positive.
    pub fn new(b: i128) -> Result<Self, NumericError> {
        if b <= 0 {
            return Err(NumericError::Domain);
        }
        Ok(Self { b })
    }

    /// The liquidity parameter (wad).
    pub fn liquidity(&self) -> i128 {
        self.b
    }

    /// Cost function `C(q_yes, q_no) = b · ln(e^(q_yes/b) + e^(q_no/b))`.
    ///
    /// Stabilized as `b · (m + ln(e^(a−m) + e^(c−m)))` with
    /// `m = max(a, c)`, keeping both exponent arguments non-positive.
    ///
    /// # Errors
    /// `Domain` for negative quantities; `Overflow` if the cost leaves
    /// the wad domain.
    pub fn cost(&self, q_yes: i128, q_no: i128) -> Result<i128, NumericError> {
        if q_yes < 0 || q_no < 0 {
            return Err(NumericError::Domain);
        }
        let b = from_wad(self.b);
        let a = from_wad(q_yes) / b;
        let c = from_wad(q_no) / b;
        let m = a.max(c);
        let lse = m + ((a - m).exp() + (c - m).exp()).ln();
        to_wad(b * lse)
    }

    /// Marginal (spot) price of one side, a wad strictly inside (0, 1).
    ///
    /// `p_yes = e^(q_yes/b) / (e^(q_yes/b) + e^(q_no/b))`; the NO price
    /// is its complement, so the two always sum to exactly one wad.
    pub fn spot_price(&self, side: Side, q_yes: i128, q_no: i128) -> Result<i128, NumericError> {
        if q_yes < 0 || q_no < 0 {
            return Err(NumericError::Domain);
        }
        let b = from_wad(self.b);
        let a = from_wad(q_yes) / b;
        let c = from_wad(q_no) / b;
        let m = a.max(c);
        let ey = (a - m).exp();
        let en = (c - m).exp();
        let p_yes = to_wad(ey / (ey + en))?;
        // Keep the price in the open interval even after rounding
        let p_yes = p_yes.clamp(1, WAD - 1);
        Ok(match side {
            Side::Yes => p_yes,
            Side::No => WAD - p_yes,
        })
    }

    /// Cost of adding `delta` shares to one side: `C(q + δ) − C(q)`.
    pub fn buy_cost(
        &self,
        side: Side,
        q_yes: i128,
        q_no: i128,
        delta: i128,
    ) -> Result<i128, NumericError> {
        let before = self.cost(q_yes, q_no)?;
        let after = match side {
            Side::Yes => self.cost(q_yes + delta, q_no)?,
            Side::No => self.cost(q_yes, q_no + delta)?,
        };
        Ok(after - before)
    }

    /// Payout for removing `shares` from one side: `C(q) − C(q − x)`.
    pub fn sell_payout(
        &self,
        side: Side,
        q_yes: i128,
        q_no: i128,
        shares: i128,
    ) -> Result<i128, NumericError> {
        let before = self.cost(q_yes, q_no)?;
        let after = match side {
            Side::Yes => self.cost(q_yes - shares, q_no)?,
            Side::No => self.cost(q_yes, q_no - shares)?,
        };
        Ok(before - after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::price_to_f64;

    #[test]
    fn test_fresh_market_price_is_half() {
        let model = CostModel::new(1_000 * WAD).unwrap();
        let p = model.spot_price(Side::Yes, 0, 0).unwrap();
        assert!((price_to_f64(p) - 0.5).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn test_fresh_market_cost_is_b_ln2() {
        let model = CostModel::new(1_000 * WAD).unwrap();
        let cost = model.cost(0, 0).unwrap();
        let expected = 1_000.0 * std::f64::consts::LN_2;
        assert!((from_wad(cost) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_prices_sum_to_one_wad_exactly() {
        let model = CostModel::new(500 * WAD).unwrap();
        let p_yes = model.spot_price(Side::Yes, 130 * WAD, 70 * WAD).unwrap();
        let p_no = model.spot_price(Side::No, 130 * WAD, 70 * WAD).unwrap();
        assert_eq!(p_yes + p_no, WAD);
    }

    #[test]
    fn test_more_yes_shares_raise_yes_price() {
        let model = CostModel::new(100 * WAD).unwrap();
        let base = model.spot_price(Side::Yes, 0, 0).unwrap();
        let skewed = model.spot_price(Side::Yes, 50 * WAD, 0).unwrap();
        assert!(skewed > base);
    }

    #[test]
    fn test_price_stays_open_interval_under_extreme_skew() {
        // q/b = 5000: naive exp overflows f64; stabilized path must not
        let model = CostModel::new(WAD).unwrap();
        let p = model.spot_price(Side::Yes, 5_000 * WAD, 0).unwrap();
        assert!(p >= 1 && p < WAD, "got {p}");
        let p_no = model.spot_price(Side::No, 5_000 * WAD, 0).unwrap();
        assert!(p_no >= 1 && p_no < WAD, "got {p_no}");
    }

    #[test]
    fn test_cost_monotone_in_each_quantity() {
        let model = CostModel::new(1_000 * WAD).unwrap();
        let c0 = model.cost(10 * WAD, 10 * WAD).unwrap();
        let c_yes = model.cost(11 * WAD, 10 * WAD).unwrap();
        let c_no = model.cost(10 * WAD, 11 * WAD).unwrap();
        assert!(c_yes > c0);
        assert!(c_no > c0);
    }

    #[test]
    fn test_buy_cost_positive_sell_payout_inverse() {
        let model = CostModel::new(1_000 * WAD).unwrap();
        let delta = 25 * WAD;
        let cost = model.buy_cost(Side::Yes, 0, 0, delta).unwrap();
        assert!(cost > 0);
        // Selling the same shares from the moved pool pays the same back
        let payout = model.sell_payout(Side::Yes, delta, 0, delta).unwrap();
        assert!((cost - payout).abs() < 1_000_000, "cost {cost} payout {payout}");
    }

    #[test]
    fn test_negative_quantity_is_domain_error() {
        let model = CostModel::new(WAD).unwrap();
        assert_eq!(model.cost(-1, 0), Err(NumericError::Domain));
        assert_eq!(model.spot_price(Side::Yes, 0, -1), Err(NumericError::Domain));
    }

    #[test]
    fn test_non_positive_b_rejected() {
        assert_eq!(CostModel::new(0).unwrap_err(), NumericError::Domain);
        assert_eq!(CostModel::new(-WAD).unwrap_err(), NumericError::Domain);
    }
}
