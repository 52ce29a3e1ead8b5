//! Trade solver: sizes trades against a pool snapshot.
//!
//! Buys invert the cost function numerically: given a net settlement
//! input, find the share amount `x ≥ 0` with
//! `C(q + x) − C(q) = net`. The inversion is a bounded bisection, not
//! the algebraic closed form — the closed form needs `exp` of
//! potentially huge arguments, while bisection keeps every evaluation
//! inside the kernel's safe range. Do not "optimize" this back to the
//! closed form.
//!
//! Sells are a direct evaluation: `C(q) − C(q − x)` for a known `x`.
//!
//! Everything here is synchronous and I/O-free; callers pass an
//! explicit pool snapshot and get a fresh simulation back.

use thiserror::Error;
use tracing::trace;

use super::fees::{FeeBreakdown, FeeSchedule};
use super::fixed::{
    from_wad, mul_div, to_wad, usdc_to_wad, wad_to_usdc, NumericError, BPS_DENOM,
};
use super::lmsr::CostModel;
use super::market::{
    MarketStatus, PoolState, SimulationResult, TradeRequest, TradeSimulation,
};

/// Bisection iteration budget. 96 halvings collapse any bracket the
/// wad domain can hold to well under the stop tolerance; exhausting
/// the budget means the inputs are pathological, and the trade is
/// treated as unsafe rather than approximated.
pub const MAX_ITERATIONS: u32 = 96;

/// Bound on the initial bracket doublings when the conservative upper
/// bound turns out short (deep pools with `b` large versus the input).
const MAX_BRACKET_EXPANSIONS: u32 = 32;

/// Relative stop tolerance: bisection stops once the bracket width is
/// below `upper / 1e12` (floored at 1e6 wei, i.e. 1e-12 shares).
const REL_TOLERANCE_DENOM: i128 = 1_000_000_000_000;
const MIN_TOLERANCE_WEI: i128 = 1_000_000;

/// Errors surfaced by trade simulation, before any ledger interaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// Numeric kernel failure; fatal to the current simulation.
    #[error(transparent)]
    Numeric(#[from] NumericError),

    /// Bisection exhausted its iteration budget without converging.
    /// The trade must be treated as unsafe, not approximated.
    #[error("solver did not converge within {iterations} iterations")]
    SolverDidNotConverge { iterations: u32 },

    /// Sell amount exceeds the outstanding quantity on that side.
    #[error("insufficient pool liquidity: requested {requested} shares, outstanding {available}")]
    InsufficientPoolLiquidity { requested: i128, available: i128 },

    /// Market is not open for trading.
    #[error("market not tradable: status {0:?}")]
    MarketClosed(MarketStatus),

    /// Pool snapshot violates a structural invariant.
    #[error("invalid pool state: {0}")]
    InvalidPool(String),

    /// Chunk plan parameters are unusable (bad margin, zero cap).
    #[error("invalid chunk plan: {0}")]
    InvalidPlan(String),

    /// A planned chunk degenerated to no output; the plan is stale.
    #[error("chunk {chunk} produced no output against rolled-forward state")]
    EmptyChunk { chunk: usize },
}

/// Simulate a trade against an immutable pool snapshot.
///
/// Returns `NoOutput` when the input is too small to register (zero
/// net after fees, or a payout that truncates to zero) — a valid
/// empty result, not an error.
pub fn simulate(
    pool: &PoolState,
    request: &TradeRequest,
) -> Result<SimulationResult, SolverError> {
    pool.check_invariants().map_err(SolverError::InvalidPool)?;
    if pool.status != MarketStatus::Active {
        return Err(SolverError::MarketClosed(pool.status));
    }

    let model = CostModel::new(pool.b)?;
    let side = request.side();
    let current_price = model.spot_price(side, pool.q_yes, pool.q_no)?;

    match *request {
        TradeRequest::Buy { amount, slippage_bps, .. } => {
            let (net, fees) = FeeSchedule::from_pool(pool).deduct(amount);
            if net <= 0 {
                return Ok(SimulationResult::NoOutput);
            }
            let net_wad = usdc_to_wad(net);
            let shares = solve_buy_shares(&model, pool, side, current_price, net_wad)?;
            if shares == 0 {
                return Ok(SimulationResult::NoOutput);
            }
            let resulting_pool = pool.roll_buy(side, shares, net, fees.vault);
            let projected_price =
                model.spot_price(side, resulting_pool.q_yes, resulting_pool.q_no)?;
            let min_guaranteed_output = apply_slippage_floor(shares, slippage_bps)?;
            trace!(
                side = %side,
                gross = amount,
                net,
                shares,
                "buy simulation solved"
            );
            Ok(SimulationResult::Quote(TradeSimulation {
                side,
                direction: request.direction(),
                input_amount: i128::from(amount),
                output_amount: shares,
                min_guaranteed_output,
                fee_breakdown: fees,
                current_price,
                projected_price,
                resulting_pool,
            }))
        }
        TradeRequest::Sell { shares, slippage_bps, .. } => {
            if shares <= 0 {
                return Ok(SimulationResult::NoOutput);
            }
            let available = pool.quantity(side);
            if shares > available {
                return Err(SolverError::InsufficientPoolLiquidity {
                    requested: shares,
                    available,
                });
            }
            let payout_wad = model.sell_payout(side, pool.q_yes, pool.q_no, shares)?;
            let payout = wad_to_usdc(payout_wad)?;
            if payout <= 0 {
                return Ok(SimulationResult::NoOutput);
            }
            let resulting_pool = pool.roll_sell(side, shares, payout);
            let projected_price =
                model.spot_price(side, resulting_pool.q_yes, resulting_pool.q_no)?;
            let min_guaranteed_output = apply_slippage_floor(i128::from(payout), slippage_bps)?;
            trace!(side = %side, shares, payout, "sell simulation evaluated");
            Ok(SimulationResult::Quote(TradeSimulation {
                side,
                direction: request.direction(),
                input_amount: shares,
                output_amount: i128::from(payout),
                min_guaranteed_output,
                // Sells never touch a fee bucket in this design
                fee_breakdown: FeeBreakdown::ZERO,
                current_price,
                projected_price,
                resulting_pool,
            }))
        }
    }
}

/// Slippage-adjusted floor: `output × (10000 − bps) / 10000`, truncated.
fn apply_slippage_floor(output: i128, slippage_bps: u16) -> Result<i128, NumericError> {
    let bps = i128::from(slippage_bps.min(10_000));
    mul_div(output, BPS_DENOM - bps, BPS_DENOM)
}

/// Bisection inversion of the buy cost.
///
/// Upper bound: shares bought cannot exceed `net / spot` (the average
/// fill price of a buy is at least the pre-trade spot), doubled as a
/// cushion and expanded further if the bracket is still short. Rounds
/// down to the affordable side of the final bracket, so the reported
/// output never overstates what the ledger will grant.
fn solve_buy_shares(
    model: &CostModel,
    pool: &PoolState,
    side: super::market::Side,
    spot: i128,
    net_wad: i128,
) -> Result<i128, SolverError> {
    let cost_of = |x: i128| model.buy_cost(side, pool.q_yes, pool.q_no, x);

    let mut hi = to_wad(from_wad(net_wad) / from_wad(spot) * 2.0)?.max(1);
    let mut expansions = 0;
    while cost_of(hi)? < net_wad {
        expansions += 1;
        if expansions > MAX_BRACKET_EXPANSIONS {
            return Err(SolverError::SolverDidNotConverge {
                iterations: expansions,
            });
        }
        hi = hi.checked_mul(2).ok_or(NumericError::Overflow)?;
    }

    let mut lo: i128 = 0;
    for _ in 0..MAX_ITERATIONS {
        let tolerance = (hi / REL_TOLERANCE_DENOM).max(MIN_TOLERANCE_WEI);
        if hi - lo <= tolerance {
            return Ok(lo);
        }
        let mid = lo + (hi - lo) / 2;
        if cost_of(mid)? < net_wad {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Err(SolverError::SolverDidNotConverge {
        iterations: MAX_ITERATIONS,
    })
}
