//! LMSR Trade Engine — Entry Point
//!
//! Initializes configuration, logging, the ledger connection, and the
//! quoting loop. Runs until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Connect the EVM provider (PRIVATE_KEY from env) + validate chain id
//! 4. Validate contract addresses have deployed code
//! 5. Create ChainLedger (implements LedgerClient port)
//! 6. Create TradeExecutor (approve → simulate → submit → confirm)
//! 7. Spawn health server (/live + /ready)
//! 8. Spawn quoting loop (poll pool state, log spot prices)
//! 9. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::chain::{ChainLedger, ContractAddresses, EvmProvider};
use adapters::health::{HealthServer, HealthState};
use domain::lmsr::CostModel;
use domain::market::{price_to_f64, Side};
use ports::ledger::LedgerClient;
use usecases::TradeExecutor;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.engine.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.engine.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.engine.dry_run,
        markets = config.markets.len(),
        call_shape = ?config.chain.call_shape,
        "Starting LMSR trade engine"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Connect ledger provider + validate contracts ─────
    let provider = Arc::new(
        EvmProvider::connect(&config.chain)
            .await
            .context("Failed to connect ledger provider")?,
    );
    let addresses = ContractAddresses::from_config(&config.chain)?;
    addresses
        .validate_deployed(provider.inner())
        .await
        .context("Contract validation failed")?;

    // ── 5. Create the ledger adapter and executor ───────────
    let ledger = Arc::new(ChainLedger::new(
        Arc::clone(&provider),
        addresses,
        &config.chain,
    ));
    let executor = Arc::new(TradeExecutor::new(Arc::clone(&ledger), &config.trading));

    // ── 6. Spawn health server ──────────────────────────────
    let health_state = Arc::new(HealthState::new());
    let health_handle = if config.health.enabled {
        let server = HealthServer::new(Arc::clone(&health_state), config.health.port);
        let health_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(health_shutdown).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    // ── 7. Spawn quoting loop ───────────────────────────────
    let quote_shutdown = shutdown_tx.subscribe();
    let quote_ledger = Arc::clone(&ledger);
    let quote_health = Arc::clone(&health_state);
    let quote_config = config.clone();
    let quote_handle = tokio::spawn(async move {
        if let Err(e) = run_quote_loop(
            quote_config,
            quote_ledger,
            Arc::clone(&executor),
            quote_health,
            quote_shutdown,
        )
        .await
        {
            error!(error = %e, "Quoting loop failed");
        }
    });

    info!("All tasks spawned — engine is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    // ── Graceful shutdown ───────────────────────────────────

    // 1. Signal all tasks to stop
    let _ = shutdown_tx.send(());
    info!("Shutdown signal broadcast to all tasks");

    // 2. Mark not ready (readiness probe → 503)
    health_state
        .engine_running
        .store(false, std::sync::atomic::Ordering::Relaxed);

    // 3. Wait for the quoting loop to finish (up to 30s)
    let _ = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        quote_handle,
    )
    .await;

    // 4. Stop health server
    if let Some(handle) = health_handle {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

/// Poll pool state for every active market and log spot prices.
///
/// Trades themselves are user-initiated through the executor; this
/// loop keeps the engine warm, verifies ledger health, and gives
/// operators a continuous view of the quoted markets.
async fn run_quote_loop(
    config: config::EngineConfig,
    ledger: Arc<ChainLedger>,
    _executor: Arc<TradeExecutor<ChainLedger>>,
    health: Arc<HealthState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let active: Vec<_> = config
        .markets
        .iter()
        .filter(|m| m.active)
        .cloned()
        .collect();

    if active.is_empty() {
        warn!("No active markets configured — engine idle");
        let _ = shutdown_rx.recv().await;
        return Ok(());
    }

    info!(
        markets = active.len(),
        dry_run = config.engine.dry_run,
        "Quoting loop started"
    );

    if config.engine.dry_run {
        warn!("Dry-run mode — quotes computed but NO transactions submitted");
    }

    let interval = std::time::Duration::from_secs(config.trading.poll_interval_secs);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("Quoting loop received shutdown signal");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                health.ledger_healthy.store(
                    ledger.is_healthy().await,
                    std::sync::atomic::Ordering::Relaxed,
                );
                for market in &active {
                    quote_market(&*ledger, market).await;
                }
            }
        }
    }

    info!("Quoting loop stopped cleanly");
    Ok(())
}

/// Read one market's pool and log its spot prices.
async fn quote_market(ledger: &ChainLedger, market: &config::MarketConfig) {
    match ledger.pool_state(&market.market_id).await {
        Ok(pool) => {
            let model = match CostModel::new(pool.b) {
                Ok(model) => model,
                Err(e) => {
                    warn!(market = %market.name, error = %e, "Invalid pool liquidity");
                    return;
                }
            };
            match (
                model.spot_price(Side::Yes, pool.q_yes, pool.q_no),
                model.spot_price(Side::No, pool.q_yes, pool.q_no),
            ) {
                (Ok(p_yes), Ok(p_no)) => {
                    info!(
                        market = %market.name,
                        p_yes = price_to_f64(p_yes),
                        p_no = price_to_f64(p_no),
                        vault = pool.vault_balance,
                        status = ?pool.status,
                        "Quote"
                    );
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!(market = %market.name, error = %e, "Price computation failed");
                }
            }
        }
        Err(e) => {
            warn!(market = %market.name, error = %e, "Pool state read failed");
        }
    }
}
