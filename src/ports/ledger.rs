//! Ledger Port - External Contract Boundary Interface
//!
//! Defines the trait for everything the engine needs from the external
//! ledger: pool-state reads, allowance and balance queries, approval,
//! trade submission, and confirmation waiting. The chain adapter
//! implements this via alloy-rs; tests implement it with mocks.
//!
//! All amounts cross this boundary as scaled integers: settlement
//! currency at 6-decimal scale (`i64`), shares at 18-decimal wad
//! (`i128`). Scale conversion lives in `domain::fixed`, never here.

use async_trait::async_trait;

use crate::domain::market::{MarketId, PoolState, Side};

/// Opaque ledger transaction identifier (hex hash).
pub type TxId = String;

/// Terminal status of a submitted transaction.
#[derive(Debug, Clone)]
pub struct TxConfirmation {
  /// The transaction this confirmation refers to.
  pub tx_id: TxId,
  /// Whether the ledger included and executed it successfully.
  /// `false` covers reverts, including minimum-output violations.
  pub confirmed: bool,
  /// Block the transaction landed in, when known.
  pub block_number: Option<u64>,
  /// Ledger-reported revert reason, when available.
  pub revert_reason: Option<String>,
}

/// Trait for the external ledger/contract boundary.
///
/// Read methods never mutate anything; write methods submit a
/// transaction and return its id without waiting for inclusion —
/// `confirm` does the waiting, so the executor can surface the
/// submit/confirm distinction in its state machine.
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
  /// Read the current pool snapshot for a market.
  async fn pool_state(&self, market_id: &MarketId) -> anyhow::Result<PoolState>;

  /// Current settlement-token allowance granted to the market
  /// contract by the engine's wallet, in raw token units.
  async fn allowance(&self) -> anyhow::Result<u128>;

  /// Settlement-currency balance of the engine's wallet (usdc).
  async fn settlement_balance(&self) -> anyhow::Result<i64>;

  /// Outcome-share balance of the engine's wallet for one side (wad).
  async fn share_balance(&self, market_id: &MarketId, side: Side) -> anyhow::Result<i128>;

  /// Submit an unlimited settlement-token approval for the market
  /// contract. One-time cost amortization: never re-approved per chunk.
  async fn approve_max(&self) -> anyhow::Result<TxId>;

  /// Submit a buy: spend `amount` usdc on `side`, reverting unless at
  /// least `min_shares` wad shares come back.
  async fn submit_buy(
    &self,
    market_id: &MarketId,
    side: Side,
    amount: i64,
    min_shares: i128,
  ) -> anyhow::Result<TxId>;

  /// Submit a sell: redeem `shares` wad of `side`, reverting unless at
  /// least `min_payout` usdc comes back.
  async fn submit_sell(
    &self,
    market_id: &MarketId,
    side: Side,
    shares: i128,
    min_payout: i64,
  ) -> anyhow::Result<TxId>;

  /// Block until the ledger acknowledges inclusion of `tx`, or the
  /// adapter's configured confirmation timeout elapses (an error).
  async fn confirm(&self, tx: &TxId) -> anyhow::Result<TxConfirmation>;

  /// Check if the ledger connection is healthy.
  async fn is_healthy(&self) -> bool;
}
