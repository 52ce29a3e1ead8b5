//! Trade Executor - Approve/Simulate/Submit/Confirm Orchestration
//!
//! Drives one user-initiated trade through the ledger as a strictly
//! sequential state machine:
//!
//! `Idle → CheckingAllowance → Approving (optional) → Simulating(i) →
//! Submitting(i) → Confirming(i) → … → Done | Failed`
//!
//! Chunks execute strictly in order: chunk i+1 is only simulated after
//! chunk i is confirmed, against a freshly re-read pool, because each
//! chunk's minimum-output floor depends on the previous chunk's actual
//! effect. Pipelining is forbidden.
//!
//! Failure of any chunk aborts the remainder immediately; chunks that
//! already confirmed are final and are reported as irreversible
//! partial fills. There is no automatic retry - a retry is a new,
//! explicit attempt re-simulated against fresh state.
//!
//! Cancellation is only possible before `execute` is called (the plan
//! from `prepare` has been presented but not confirmed by the user).
//! Once a chunk has been submitted it cannot be cancelled; the ledger
//! transaction may still revert independently, which is a normal
//! failure path, not a cancellation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::TradingConfig;
use crate::domain::chunks::{plan_chunks, simulate_plan, ChunkPlan, PlanPreview};
use crate::domain::market::{Direction, MarketId, SimulationResult, TradeRequest};
use crate::domain::solver::{simulate, SolverError};
use crate::ports::ledger::{LedgerClient, TxId};

/// Progress of one trade attempt through the execution state machine.
///
/// Chunk indices are zero-based; `total` is the plan length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
  /// No attempt in flight.
  Idle,
  /// Reading the current spender allowance (buys only).
  CheckingAllowance,
  /// Unlimited approval submitted, waiting for confirmation.
  Approving,
  /// Re-simulating a chunk against freshly read pool state.
  Simulating { chunk: usize, total: usize },
  /// Chunk transaction submitted to the ledger.
  Submitting { chunk: usize, total: usize },
  /// Waiting for the ledger to acknowledge inclusion.
  Confirming { chunk: usize, total: usize },
  /// All chunks confirmed and state refreshed.
  Done { completed_chunks: usize },
  /// Attempt aborted; settled chunks are final.
  Failed { completed_chunks: usize, reason: String },
}

/// Why a trade attempt aborted.
#[derive(Debug, Error)]
pub enum ExecutionError {
  /// Approval transaction rejected or timed out. Nothing was traded.
  #[error("approval failed: {0}")]
  ApprovalFailed(String),

  /// A chunk's re-simulation failed against fresh pool state.
  #[error("simulation failed for chunk {chunk}: {source}")]
  Simulation {
    chunk: usize,
    #[source]
    source: SolverError,
  },

  /// The ledger rejected a chunk's submission outright.
  #[error("submission failed for chunk {chunk}: {reason}")]
  Submission { chunk: usize, reason: String },

  /// A chunk reverted or its confirmation timed out. This includes
  /// minimum-output (slippage) violations.
  #[error("confirmation failed for chunk {chunk}: {reason}")]
  Confirmation { chunk: usize, reason: String },

  /// A ledger read failed before anything was submitted for the
  /// current chunk.
  #[error("ledger read failed: {0}")]
  Ledger(String),
}

/// Terminal failure report: the error plus what already settled so the
/// caller can reconcile actual position versus intended trade.
#[derive(Debug, Error)]
#[error("trade aborted after {completed_chunks}/{total_chunks} chunk(s) settled: {error}")]
pub struct ExecutionFailure {
  #[source]
  pub error: ExecutionError,
  /// Chunks that confirmed before the abort. Final and irreversible.
  pub completed_chunks: usize,
  pub total_chunks: usize,
  /// Transaction ids of the settled chunks.
  pub settled_txs: Vec<TxId>,
}

/// Summary of a fully settled trade attempt.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
  pub attempt_id: Uuid,
  pub market_id: MarketId,
  pub direction: Direction,
  pub completed_chunks: usize,
  pub total_chunks: usize,
  /// Sum of chunk inputs, native scale (usdc for buys, wad for sells).
  pub total_input: i128,
  /// Sum of simulated chunk outputs. The ledger's realized outputs are
  /// at least the per-chunk minimum floors, never below.
  pub total_output: i128,
  pub tx_ids: Vec<TxId>,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
}

/// Orchestrates trade attempts against a ledger port.
///
/// One executor serves one session: a `Mutex` serializes attempts so
/// no two trades for the same session are ever in flight concurrently.
pub struct TradeExecutor<L: LedgerClient> {
  /// Ledger port.
  ledger: Arc<L>,
  /// Impact-guard safety margin (bps) used by `prepare`.
  safety_margin_bps: u16,
  /// Published state transitions for the current attempt.
  state_tx: watch::Sender<ExecutionState>,
  /// Serializes attempts; held for the lifetime of `execute`.
  attempt_lock: Mutex<()>,
}

impl<L: LedgerClient> TradeExecutor<L> {
  /// Create a new executor.
  pub fn new(ledger: Arc<L>, config: &TradingConfig) -> Self {
    let (state_tx, _) = watch::channel(ExecutionState::Idle);
    Self {
      ledger,
      safety_margin_bps: config.safety_margin_bps,
      state_tx,
      attempt_lock: Mutex::new(()),
    }
  }

  /// Observe state transitions of the in-flight attempt.
  pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
    self.state_tx.subscribe()
  }

  /// Build the consent artifact for a request: the chunk plan plus a
  /// per-chunk preview simulated against rolled-forward pool state.
  ///
  /// Nothing is submitted here. The caller shows the preview to the
  /// user and calls `execute` only after explicit confirmation -
  /// splitting changes the realized average price, so consent matters.
  #[instrument(skip(self, request), fields(market = %market_id))]
  pub async fn prepare(
    &self,
    market_id: &MarketId,
    request: &TradeRequest,
  ) -> Result<PlanPreview, ExecutionError> {
    let pool = self
      .ledger
      .pool_state(market_id)
      .await
      .map_err(|e| ExecutionError::Ledger(e.to_string()))?;
    let plan = plan_chunks(&pool, request, self.safety_margin_bps)
      .map_err(|source| ExecutionError::Simulation { chunk: 0, source })?;
    let preview = simulate_plan(&pool, request, &plan)
      .map_err(|source| ExecutionError::Simulation { chunk: 0, source })?;
    info!(
      chunks = preview.plan.len(),
      total_output = preview.total_output,
      "Trade plan prepared"
    );
    Ok(preview)
  }

  /// Execute a confirmed chunk plan.
  ///
  /// Blocks if another attempt is in flight; attempts never overlap.
  #[instrument(skip_all, fields(market = %market_id, chunks = plan.len()))]
  pub async fn execute(
    &self,
    market_id: &MarketId,
    request: &TradeRequest,
    plan: &ChunkPlan,
  ) -> Result<ExecutionReport, ExecutionFailure> {
    let _attempt = self.attempt_lock.lock().await;

    let attempt_id = Uuid::new_v4();
    let started_at = Utc::now();
    let total = plan.len();
    let mut settled: Vec<TxId> = Vec::new();
    let mut total_output: i128 = 0;

    info!(%attempt_id, direction = %request.direction(), "Trade attempt started");

    // One-time allowance amortization: approve unlimited once, never
    // per chunk. Sells spend shares, not settlement currency.
    if request.direction() == Direction::Buy {
      if let Err(error) = self.ensure_allowance(request).await {
        return Err(self.fail(error, &settled, total));
      }
    }

    for (chunk, &amount) in plan.chunks.iter().enumerate() {
      // Re-simulate against the latest pool: earlier chunks (and any
      // third-party trades) have moved the price since the preview.
      self.transition(ExecutionState::Simulating { chunk, total });
      let pool = match self.ledger.pool_state(market_id).await {
        Ok(pool) => pool,
        Err(e) => {
          return Err(self.fail(ExecutionError::Ledger(e.to_string()), &settled, total));
        }
      };
      let chunk_request = request.with_amount(amount);
      let sim = match simulate(&pool, &chunk_request) {
        Ok(SimulationResult::Quote(sim)) => sim,
        Ok(SimulationResult::NoOutput) => {
          let source = SolverError::EmptyChunk { chunk };
          return Err(self.fail(ExecutionError::Simulation { chunk, source }, &settled, total));
        }
        Err(source) => {
          return Err(self.fail(ExecutionError::Simulation { chunk, source }, &settled, total));
        }
      };

      self.transition(ExecutionState::Submitting { chunk, total });
      let submitted = match chunk_request {
        TradeRequest::Buy { side, amount, .. } => {
          self
            .ledger
            .submit_buy(market_id, side, amount, sim.min_guaranteed_output)
            .await
        }
        TradeRequest::Sell { side, shares, .. } => {
          self
            .ledger
            .submit_sell(market_id, side, shares, sim.min_guaranteed_output as i64)
            .await
        }
      };
      let tx = match submitted {
        Ok(tx) => tx,
        Err(e) => {
          let error = ExecutionError::Submission { chunk, reason: e.to_string() };
          return Err(self.fail(error, &settled, total));
        }
      };

      self.transition(ExecutionState::Confirming { chunk, total });
      match self.ledger.confirm(&tx).await {
        Ok(conf) if conf.confirmed => {
          info!(chunk, tx = %tx, block = ?conf.block_number, "Chunk confirmed");
          settled.push(tx);
          total_output += sim.output_amount;
        }
        Ok(conf) => {
          let reason = conf
            .revert_reason
            .unwrap_or_else(|| "transaction reverted".to_string());
          let error = ExecutionError::Confirmation { chunk, reason };
          return Err(self.fail(error, &settled, total));
        }
        Err(e) => {
          let error = ExecutionError::Confirmation { chunk, reason: e.to_string() };
          return Err(self.fail(error, &settled, total));
        }
      }
    }

    // Refresh dependent state so the caller's next simulation starts
    // from reality. Best effort: the trade itself has already settled.
    if let Err(e) = self.refresh(market_id).await {
      warn!(error = %e, "Post-trade state refresh failed");
    }

    self.transition(ExecutionState::Done { completed_chunks: total });
    info!(%attempt_id, chunks = total, "Trade attempt complete");

    Ok(ExecutionReport {
      attempt_id,
      market_id: market_id.clone(),
      direction: request.direction(),
      completed_chunks: total,
      total_chunks: total,
      total_input: plan.total(),
      total_output,
      tx_ids: settled,
      started_at,
      finished_at: Utc::now(),
    })
  }

  /// Check the spender allowance and approve unlimited if short.
  async fn ensure_allowance(&self, request: &TradeRequest) -> Result<(), ExecutionError> {
    self.transition(ExecutionState::CheckingAllowance);
    let allowance = self
      .ledger
      .allowance()
      .await
      .map_err(|e| ExecutionError::Ledger(e.to_string()))?;

    let needed = request.amount_native().unsigned_abs();
    if u128::from(allowance) >= u128::try_from(needed).unwrap_or(u128::MAX) {
      return Ok(());
    }

    self.transition(ExecutionState::Approving);
    let tx = self
      .ledger
      .approve_max()
      .await
      .map_err(|e| ExecutionError::ApprovalFailed(e.to_string()))?;
    let conf = self
      .ledger
      .confirm(&tx)
      .await
      .map_err(|e| ExecutionError::ApprovalFailed(e.to_string()))?;
    if !conf.confirmed {
      let reason = conf
        .revert_reason
        .unwrap_or_else(|| "approval reverted".to_string());
      return Err(ExecutionError::ApprovalFailed(reason));
    }
    info!(tx = %tx, "Unlimited approval confirmed");
    Ok(())
  }

  /// Re-read pool state and balances after the final confirmation.
  async fn refresh(&self, market_id: &MarketId) -> anyhow::Result<()> {
    let pool = self.ledger.pool_state(market_id).await?;
    let balance = self.ledger.settlement_balance().await?;
    info!(
      q_yes = pool.q_yes,
      q_no = pool.q_no,
      vault = pool.vault_balance,
      balance,
      "Post-trade state refreshed"
    );
    Ok(())
  }

  /// Publish a terminal failure state and build the failure report.
  fn fail(
    &self,
    error: ExecutionError,
    settled: &[TxId],
    total_chunks: usize,
  ) -> ExecutionFailure {
    warn!(
      error = %error,
      settled = settled.len(),
      "Trade attempt aborted - settled chunks are final"
    );
    self.transition(ExecutionState::Failed {
      completed_chunks: settled.len(),
      reason: error.to_string(),
    });
    ExecutionFailure {
      error,
      completed_chunks: settled.len(),
      total_chunks,
      settled_txs: settled.to_vec(),
    }
  }

  fn transition(&self, state: ExecutionState) {
    // Nobody subscribed is fine; send_replace never fails
    let _ = self.state_tx.send_replace(state);
  }
}
