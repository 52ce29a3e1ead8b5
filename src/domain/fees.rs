//! Fee split engine.
//!
//! Buy inputs carry three basis-point fee buckets — treasury, vault,
//! and liquidity providers — applied to the gross amount in that fixed
//! order, each truncated toward zero at the 6-decimal settlement scale
//! before summing. Sells carry no fee in this design: the breakdown is
//! always all-zero on the sell path.

use serde::{Deserialize, Serialize};

use super::fixed::apply_bps;
use super::market::PoolState;

/// Per-bucket fee amounts for one trade, in settlement units (usdc).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub treasury: i64,
    pub vault: i64,
    pub lp: i64,
}

impl FeeBreakdown {
    /// All-zero breakdown (sells, and zero-amount buys).
    pub const ZERO: Self = Self { treasury: 0, vault: 0, lp: 0 };

    /// Total fee across buckets.
    pub fn total(&self) -> i64 {
        self.treasury + self.vault + self.lp
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Basis-point fee schedule for a market, read from pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub treasury_bps: u16,
    pub vault_bps: u16,
    pub lp_bps: u16,
}

impl FeeSchedule {
    /// Extract the schedule a pool snapshot advertises.
    pub fn from_pool(pool: &PoolState) -> Self {
        Self {
            treasury_bps: pool.fee_bps_treasury,
            vault_bps: pool.fee_bps_vault,
            lp_bps: pool.fee_bps_lp,
        }
    }

    /// Deduct fees from a gross buy input.
    ///
    /// Buckets are computed against the gross amount in the fixed order
    /// treasury → vault → lp, each truncated independently. Returns the
    /// net input and the breakdown. The net can reach zero for dust
    /// inputs; callers treat that as a no-output simulation.
    pub fn deduct(&self, gross: i64) -> (i64, FeeBreakdown) {
        if gross <= 0 {
            return (0, FeeBreakdown::ZERO);
        }
        let breakdown = FeeBreakdown {
            treasury: apply_bps(gross, self.treasury_bps),
            vault: apply_bps(gross, self.vault_bps),
            lp: apply_bps(gross, self.lp_bps),
        };
        (gross - breakdown.total(), breakdown)
    }
}
