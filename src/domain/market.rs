//! Core market domain types.
//!
//! Defines the pool snapshot, trade request, and simulation types the
//! solver and executor operate on. These are the hexagonal inner ring:
//! pure data, no I/O, serializable and testable in isolation.
//!
//! Scale conventions (see `domain::fixed`):
//! - `q_yes`, `q_no`, `b`, shares, prices: 18-decimal wad `i128`
//! - `vault_balance`, `max_impact_amount`, settlement amounts: 6-decimal `i64`

use serde::{Deserialize, Serialize};

use super::fees::FeeBreakdown;
use super::fixed::WAD;

/// Lightweight market identifier used at the ports boundary.
pub type MarketId = String;

/// Outcome side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle status of a market, as reported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    /// Open for trading.
    Active,
    /// Outcome determined; only redemption remains.
    Resolved,
    /// Voided; positions refundable, no trading.
    Cancelled,
}

/// Immutable snapshot of a market's pool, read from the ledger.
///
/// The engine never mutates observed pool state; it only derives
/// rolled-forward copies during simulation. The ledger alone advances
/// the real pool via confirmed transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Ledger market identifier.
    pub market_id: MarketId,
    /// Outstanding YES claims (wad).
    pub q_yes: i128,
    /// Outstanding NO claims (wad).
    pub q_no: i128,
    /// LMSR depth parameter `b` (wad, > 0).
    pub b: i128,
    /// Collected settlement-currency balance (usdc).
    pub vault_balance: i64,
    /// Treasury fee split in basis points.
    pub fee_bps_treasury: u16,
    /// Vault fee split in basis points.
    pub fee_bps_vault: u16,
    /// Liquidity-provider fee split in basis points.
    pub fee_bps_lp: u16,
    /// Market lifecycle status.
    pub status: MarketStatus,
    /// Largest single-transaction input before the impact guard must
    /// split the order (usdc).
    pub max_impact_amount: i64,
}

impl PoolState {
    /// Check the structural invariants the solver relies on.
    ///
    /// Returns a description of the first violation, if any.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.q_yes < 0 {
            return Err(format!("q_yes must be non-negative, got {}", self.q_yes));
        }
        if self.q_no < 0 {
            return Err(format!("q_no must be non-negative, got {}", self.q_no));
        }
        if self.b <= 0 {
            return Err(format!("liquidity parameter b must be positive, got {}", self.b));
        }
        let fee_sum = u32::from(self.fee_bps_treasury)
            + u32::from(self.fee_bps_vault)
            + u32::from(self.fee_bps_lp);
        if fee_sum > 10_000 {
            return Err(format!("fee splits must sum to <= 10000 bps, got {fee_sum}"));
        }
        Ok(())
    }

    /// Derive the pool that results from adding `delta` wad shares to
    /// one side and `net_in` usdc to the vault (a simulated buy).
    pub fn roll_buy(&self, side: Side, delta: i128, net_in: i64, vault_fee: i64) -> Self {
        let mut next = self.clone();
        match side {
            Side::Yes => next.q_yes += delta,
            Side::No => next.q_no += delta,
        }
        next.vault_balance = next.vault_balance.saturating_add(net_in).saturating_add(vault_fee);
        next
    }

    /// Derive the pool that results from redeeming `shares` from one
    /// side against a `payout` usdc debit (a simulated sell).
    pub fn roll_sell(&self, side: Side, shares: i128, payout: i64) -> Self {
        let mut next = self.clone();
        match side {
            Side::Yes => next.q_yes -= shares,
            Side::No => next.q_no -= shares,
        }
        next.vault_balance = next.vault_balance.saturating_sub(payout);
        next
    }

    /// Outstanding quantity on one side.
    pub fn quantity(&self, side: Side) -> i128 {
        match side {
            Side::Yes => self.q_yes,
            Side::No => self.q_no,
        }
    }
}

/// A user-initiated trade request.
///
/// Buys are denominated in settlement currency (usdc input); sells in
/// shares (wad input). The variants keep the two scales apart so they
/// can never be mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeRequest {
    /// Spend `amount` settlement units buying `side` shares.
    Buy {
        side: Side,
        /// Gross settlement-currency input (usdc), fees included.
        amount: i64,
        /// Slippage tolerance applied to the simulated output.
        slippage_bps: u16,
    },
    /// Redeem `shares` of `side` for settlement currency.
    Sell {
        side: Side,
        /// Share input (wad).
        shares: i128,
        /// Slippage tolerance applied to the simulated payout.
        slippage_bps: u16,
    },
}

impl TradeRequest {
    pub fn side(&self) -> Side {
        match self {
            Self::Buy { side, .. } | Self::Sell { side, .. } => *side,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Buy { .. } => Direction::Buy,
            Self::Sell { .. } => Direction::Sell,
        }
    }

    pub fn slippage_bps(&self) -> u16 {
        match self {
            Self::Buy { slippage_bps, .. } | Self::Sell { slippage_bps, .. } => *slippage_bps,
        }
    }

    /// Replace the request amount, keeping side/direction/slippage.
    /// Used by the chunk planner to derive per-chunk sub-requests.
    pub fn with_amount(&self, amount: i128) -> Self {
        match *self {
            Self::Buy { side, slippage_bps, .. } => Self::Buy {
                side,
                amount: amount as i64,
                slippage_bps,
            },
            Self::Sell { side, slippage_bps, .. } => Self::Sell {
                side,
                shares: amount,
                slippage_bps,
            },
        }
    }

    /// Request amount in its native scale, widened to `i128`.
    pub fn amount_native(&self) -> i128 {
        match *self {
            Self::Buy { amount, .. } => i128::from(amount),
            Self::Sell { shares, .. } => shares,
        }
    }
}

/// Outcome of simulating a trade against a pool snapshot.
///
/// Derived fresh on every input change or pool refresh; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSimulation {
    /// Side being traded.
    pub side: Side,
    /// Buy or sell.
    pub direction: Direction,
    /// Input amount in the request's native scale.
    pub input_amount: i128,
    /// Simulated output: shares (wad) for buys, settlement (usdc,
    /// widened) for sells.
    pub output_amount: i128,
    /// Slippage-adjusted floor the ledger transaction must meet.
    pub min_guaranteed_output: i128,
    /// Per-bucket fee amounts (all-zero for sells).
    pub fee_breakdown: FeeBreakdown,
    /// Spot price of the traded side before the trade (wad, in (0,1)).
    pub current_price: i128,
    /// Spot price of the traded side after the trade (wad, in (0,1)).
    pub projected_price: i128,
    /// Pool state the trade would leave behind.
    pub resulting_pool: PoolState,
}

/// A simulation either yields a quote or degenerates to nothing
/// (input too small to register after fees) — a valid empty result,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationResult {
    Quote(TradeSimulation),
    NoOutput,
}

impl SimulationResult {
    /// Unwrap the quote, if present.
    pub fn quote(self) -> Option<TradeSimulation> {
        match self {
            Self::Quote(sim) => Some(sim),
            Self::NoOutput => None,
        }
    }
}

/// A price expressed as a wad in the open interval (0, 1).
/// Helper for display/assertions.
pub fn price_to_f64(price_wad: i128) -> f64 {
    price_wad as f64 / WAD as f64
}
