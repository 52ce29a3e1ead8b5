//! Impact guard and chunk planner.
//!
//! Each market advertises `max_impact_amount`, the largest
//! single-transaction input allowed before an order must be split.
//! Orders over the cap are partitioned into bounded sub-trades sized
//! to the cap times a safety margin, the last chunk taking the
//! remainder.
//!
//! A plan is a consent artifact: splitting changes the realized
//! average price versus a hypothetical unsplit fill, so the plan
//! (chunk size, count, per-chunk preview) must be shown to the user
//! before anything is submitted. Previews roll each chunk forward
//! onto the previous chunk's resulting pool, so later chunks' minimum
//! output floors already reflect the price impact of earlier chunks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fixed::{from_wad, mul_div, to_wad, usdc_to_wad, BPS_DENOM};
use super::lmsr::CostModel;
use super::market::{Direction, PoolState, SimulationResult, TradeRequest, TradeSimulation};
use super::solver::{simulate, SolverError};

/// Ordered partition of a trade request into bounded-impact chunks.
///
/// Amounts are in the request's native scale: usdc for buys, wad
/// shares for sells. Discarded once execution completes or aborts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPlan {
    /// Sub-amounts; their sum equals the original request amount.
    pub chunks: Vec<i128>,
    /// Margined per-chunk cap every chunk but the last is sized to.
    pub chunk_cap: i128,
    /// Safety margin applied to `max_impact_amount`, in bps.
    pub margin_bps: u16,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether the impact guard actually split the order.
    pub fn is_split(&self) -> bool {
        self.chunks.len() > 1
    }

    /// Sum of all chunk amounts (equals the original request amount).
    pub fn total(&self) -> i128 {
        self.chunks.iter().sum()
    }
}

/// Per-chunk simulations plus plan totals, for user consent display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPreview {
    pub plan: ChunkPlan,
    /// One simulation per chunk, each against the rolled-forward pool.
    pub simulations: Vec<TradeSimulation>,
    /// Sum of simulated outputs across chunks.
    pub total_output: i128,
    /// Sum of slippage floors across chunks.
    pub total_min_output: i128,
}

/// Build a chunk plan for a request against a pool snapshot.
///
/// Requests at or under `max_impact_amount` get a single-element plan.
/// Oversized requests are split into `ceil(total / cap)` chunks where
/// `cap = max_impact_amount × margin_bps / 10000`, the last chunk
/// sized to the remainder.
pub fn plan_chunks(
    pool: &PoolState,
    request: &TradeRequest,
    margin_bps: u16,
) -> Result<ChunkPlan, SolverError> {
    if margin_bps == 0 || margin_bps > 10_000 {
        return Err(SolverError::InvalidPlan(format!(
            "safety margin must be in (0, 10000] bps, got {margin_bps}"
        )));
    }
    pool.check_invariants().map_err(SolverError::InvalidPool)?;

    let total = request.amount_native();
    let raw_cap = native_impact_cap(pool, request)?;
    let margined_cap = mul_div(raw_cap, i128::from(margin_bps), BPS_DENOM)?;

    if total <= raw_cap {
        return Ok(ChunkPlan {
            chunks: vec![total],
            chunk_cap: margined_cap,
            margin_bps,
        });
    }
    if margined_cap < 1 {
        return Err(SolverError::InvalidPlan(format!(
            "impact cap {raw_cap} with margin {margin_bps} bps leaves no room to split"
        )));
    }

    let count = (total + margined_cap - 1) / margined_cap;
    let count = usize::try_from(count)
        .map_err(|_| SolverError::InvalidPlan("chunk count out of range".to_string()))?;
    let mut chunks = vec![margined_cap; count - 1];
    chunks.push(total - margined_cap * (count as i128 - 1));

    debug!(
        total,
        cap = margined_cap,
        count,
        "impact guard split oversized order"
    );
    Ok(ChunkPlan {
        chunks,
        chunk_cap: margined_cap,
        margin_bps,
    })
}

/// Simulate every chunk of a plan, rolling the pool forward between
/// chunks, and aggregate the preview totals.
pub fn simulate_plan(
    pool: &PoolState,
    request: &TradeRequest,
    plan: &ChunkPlan,
) -> Result<PlanPreview, SolverError> {
    let mut simulations = Vec::with_capacity(plan.len());
    let mut rolling = pool.clone();
    for (i, &amount) in plan.chunks.iter().enumerate() {
        let chunk_request = request.with_amount(amount);
        match simulate(&rolling, &chunk_request)? {
            SimulationResult::Quote(sim) => {
                rolling = sim.resulting_pool.clone();
                simulations.push(sim);
            }
            SimulationResult::NoOutput => {
                return Err(SolverError::EmptyChunk { chunk: i });
            }
        }
    }
    let total_output = simulations.iter().map(|s| s.output_amount).sum();
    let total_min_output = simulations.iter().map(|s| s.min_guaranteed_output).sum();
    Ok(PlanPreview {
        plan: plan.clone(),
        simulations,
        total_output,
        total_min_output,
    })
}

/// The impact cap expressed in the request's native amount scale.
///
/// Buys compare directly against the settlement-currency cap. Sell
/// inputs are shares, so the cap is converted to an approximate share
/// count at the current spot price of the sold side.
fn native_impact_cap(pool: &PoolState, request: &TradeRequest) -> Result<i128, SolverError> {
    let cap_usdc = i128::from(pool.max_impact_amount);
    match request.direction() {
        Direction::Buy => Ok(cap_usdc),
        Direction::Sell => {
            let model = CostModel::new(pool.b)?;
            let spot = model.spot_price(request.side(), pool.q_yes, pool.q_no)?;
            let cap_shares =
                to_wad(from_wad(usdc_to_wad(pool.max_impact_amount)) / from_wad(spot))?;
            Ok(cap_shares)
        }
    }
}
