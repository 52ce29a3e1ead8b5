//! LMSR Pricing Benchmarks — Hot-Path Performance Validation
//!
//! Benchmarks the domain functions that run on every quote refresh
//! and every keystroke-driven re-simulation.
//!
//! Run with: cargo bench --bench lmsr_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lmsr_trade_engine::domain::chunks::{plan_chunks, simulate_plan};
use lmsr_trade_engine::domain::fixed::{USDC_SCALE, WAD};
use lmsr_trade_engine::domain::lmsr::CostModel;
use lmsr_trade_engine::domain::market::{MarketStatus, PoolState, Side, TradeRequest};
use lmsr_trade_engine::domain::solver::simulate;

fn pool() -> PoolState {
    PoolState {
        market_id: "0xmarket".to_string(),
        q_yes: 130 * WAD,
        q_no: 70 * WAD,
        b: 1_000 * WAD,
        vault_balance: 500 * USDC_SCALE,
        fee_bps_treasury: 100,
        fee_bps_vault: 50,
        fee_bps_lp: 50,
        status: MarketStatus::Active,
        max_impact_amount: 50 * USDC_SCALE,
    }
}

/// Benchmark spot price computation for a binary market.
fn bench_spot_price(c: &mut Criterion) {
    let model = CostModel::new(1_000 * WAD).unwrap();

    c.bench_function("lmsr_spot_price", |b| {
        b.iter(|| {
            let _price = model
                .spot_price(Side::Yes, black_box(130 * WAD), black_box(70 * WAD))
                .unwrap();
        });
    });
}

/// Benchmark the cost function (buy 10 shares).
fn bench_buy_cost(c: &mut Criterion) {
    let model = CostModel::new(1_000 * WAD).unwrap();

    c.bench_function("lmsr_buy_cost_10_shares", |b| {
        b.iter(|| {
            let _cost = model
                .buy_cost(
                    Side::Yes,
                    black_box(130 * WAD),
                    black_box(70 * WAD),
                    black_box(10 * WAD),
                )
                .unwrap();
        });
    });
}

/// Benchmark the full buy simulation, including bisection inversion.
fn bench_buy_simulation(c: &mut Criterion) {
    let pool = pool();
    let request = TradeRequest::Buy {
        side: Side::Yes,
        amount: 100 * USDC_SCALE,
        slippage_bps: 100,
    };

    c.bench_function("solver_buy_simulation", |b| {
        b.iter(|| {
            let _sim = simulate(black_box(&pool), black_box(&request)).unwrap();
        });
    });
}

/// Benchmark planning and previewing an oversized chunked order.
fn bench_chunk_preview(c: &mut Criterion) {
    let pool = pool();
    let request = TradeRequest::Buy {
        side: Side::Yes,
        amount: 500 * USDC_SCALE,
        slippage_bps: 100,
    };

    c.bench_function("chunk_plan_and_preview", |b| {
        b.iter(|| {
            let plan = plan_chunks(black_box(&pool), &request, 9_800).unwrap();
            let _preview = simulate_plan(&pool, &request, &plan).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_spot_price,
    bench_buy_cost,
    bench_buy_simulation,
    bench_chunk_preview,
);
criterion_main!(benches);
