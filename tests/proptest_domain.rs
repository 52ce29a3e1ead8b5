//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that the pricing, fee, solver, and
//! chunking components maintain their invariants across random inputs.

use proptest::prelude::*;

use lmsr_trade_engine::domain::chunks::plan_chunks;
use lmsr_trade_engine::domain::fees::FeeSchedule;
use lmsr_trade_engine::domain::fixed::{USDC_SCALE, WAD};
use lmsr_trade_engine::domain::lmsr::CostModel;
use lmsr_trade_engine::domain::market::{
    MarketStatus, PoolState, Side, SimulationResult, TradeRequest,
};
use lmsr_trade_engine::domain::solver::simulate;

fn pool(q_yes: i128, q_no: i128, b: i128, fees: (u16, u16, u16)) -> PoolState {
    PoolState {
        market_id: "0xmarket".to_string(),
        q_yes,
        q_no,
        b,
        vault_balance: 0,
        fee_bps_treasury: fees.0,
        fee_bps_vault: fees.1,
        fee_bps_lp: fees.2,
        status: MarketStatus::Active,
        max_impact_amount: 50 * USDC_SCALE,
    }
}

// ── Cost Model Properties ───────────────────────────────────

proptest! {
    /// Spot prices must stay strictly inside (0, 1) for any quantities.
    #[test]
    fn price_always_in_open_unit_interval(
        q_yes in 0i128..5_000,
        q_no in 0i128..5_000,
        b in 1i128..2_000,
    ) {
        let model = CostModel::new(b * WAD).unwrap();
        let p = model.spot_price(Side::Yes, q_yes * WAD, q_no * WAD).unwrap();
        prop_assert!(p >= 1, "price must be > 0 wad-wei, got {p}");
        prop_assert!(p <= WAD - 1, "price must be < 1, got {p}");
    }

    /// YES and NO prices must sum to exactly one wad.
    #[test]
    fn prices_sum_to_exactly_one(
        q_yes in 0i128..5_000,
        q_no in 0i128..5_000,
        b in 1i128..2_000,
    ) {
        let model = CostModel::new(b * WAD).unwrap();
        let p_yes = model.spot_price(Side::Yes, q_yes * WAD, q_no * WAD).unwrap();
        let p_no = model.spot_price(Side::No, q_yes * WAD, q_no * WAD).unwrap();
        prop_assert_eq!(p_yes + p_no, WAD);
    }

    /// Cost must be strictly increasing in the bought quantity.
    #[test]
    fn cost_monotone_in_quantity(
        q in 0i128..2_000,
        delta in 1i128..500,
        b in 10i128..1_000,
    ) {
        let model = CostModel::new(b * WAD).unwrap();
        let cost = model.buy_cost(Side::Yes, q * WAD, q * WAD, delta * WAD).unwrap();
        prop_assert!(cost > 0, "buy cost must be positive, got {cost}");
    }
}

// ── Fee Schedule Properties ─────────────────────────────────

proptest! {
    /// Net plus the fee buckets must reconstruct the gross exactly.
    #[test]
    fn fee_deduction_conserves_gross(
        gross in 1i64..1_000_000_000_000,
        treasury in 0u16..3_000,
        vault in 0u16..3_000,
        lp in 0u16..3_000,
    ) {
        let schedule = FeeSchedule {
            treasury_bps: treasury,
            vault_bps: vault,
            lp_bps: lp,
        };
        let (net, fees) = schedule.deduct(gross);
        prop_assert_eq!(net + fees.total(), gross);
        prop_assert!(net >= 0);
    }

    /// Truncation means each bucket never exceeds its exact share.
    #[test]
    fn fee_buckets_never_round_up(
        gross in 1i64..1_000_000_000_000,
        bps in 0u16..10_000,
    ) {
        let schedule = FeeSchedule { treasury_bps: bps, vault_bps: 0, lp_bps: 0 };
        let (_, fees) = schedule.deduct(gross);
        let exact = i128::from(gross) * i128::from(bps);
        prop_assert!(i128::from(fees.treasury) * 10_000 <= exact);
    }
}

// ── Solver Properties ───────────────────────────────────────

proptest! {
    /// The slippage floor never exceeds the simulated output, and the
    /// cost of the reported shares never exceeds the net input.
    #[test]
    fn buy_output_floor_and_affordability(
        amount in 1i64..10_000,
        slippage in 0u16..1_000,
        q_yes in 0i128..1_000,
        q_no in 0i128..1_000,
    ) {
        let p = pool(q_yes * WAD, q_no * WAD, 1_000 * WAD, (100, 50, 50));
        let request = TradeRequest::Buy {
            side: Side::Yes,
            amount: amount * USDC_SCALE,
            slippage_bps: slippage,
        };
        if let SimulationResult::Quote(sim) = simulate(&p, &request).unwrap() {
            prop_assert!(sim.min_guaranteed_output <= sim.output_amount);
            prop_assert!(sim.output_amount > 0);
            prop_assert!(sim.projected_price > sim.current_price);
        }
    }

    /// A buy immediately unwound sells back for no more than was spent.
    #[test]
    fn round_trip_never_profits(
        amount in 1i64..5_000,
        q_yes in 0i128..500,
    ) {
        let p = pool(q_yes * WAD, 0, 1_000 * WAD, (0, 0, 0));
        let request = TradeRequest::Buy {
            side: Side::Yes,
            amount: amount * USDC_SCALE,
            slippage_bps: 0,
        };
        if let SimulationResult::Quote(buy) = simulate(&p, &request).unwrap() {
            let unwind = TradeRequest::Sell {
                side: Side::Yes,
                shares: buy.output_amount,
                slippage_bps: 0,
            };
            if let SimulationResult::Quote(sell) =
                simulate(&buy.resulting_pool, &unwind).unwrap()
            {
                // Conservative rounding: payout ≤ spent, within one
                // settlement-wei of truncation slack
                prop_assert!(
                    sell.output_amount <= i128::from(amount * USDC_SCALE) + 1,
                    "spent {} got back {}",
                    amount * USDC_SCALE,
                    sell.output_amount
                );
            }
        }
    }
}

// ── Chunk Planner Properties ────────────────────────────────

proptest! {
    /// Chunks must sum to the request and respect the margined cap.
    #[test]
    fn chunk_plan_partitions_exactly(
        amount in 1i64..100_000,
        cap in 1i64..1_000,
        margin in 1u16..=10_000,
    ) {
        let p = pool(0, 0, 1_000 * WAD, (0, 0, 0));
        let p = PoolState { max_impact_amount: cap * USDC_SCALE, ..p };
        let request = TradeRequest::Buy {
            side: Side::Yes,
            amount: amount * USDC_SCALE,
            slippage_bps: 100,
        };
        if let Ok(plan) = plan_chunks(&p, &request, margin) {
            prop_assert_eq!(plan.total(), i128::from(amount) * i128::from(USDC_SCALE));
            prop_assert!(!plan.is_empty());
            if plan.is_split() {
                for &chunk in &plan.chunks {
                    prop_assert!(chunk <= plan.chunk_cap, "chunk {chunk} over cap");
                    prop_assert!(chunk > 0);
                }
            }
        }
    }
}
