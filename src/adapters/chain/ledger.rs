//! Chain Ledger - `LedgerClient` Port Implementation
//!
//! Implements the ledger port against the deployed LMSR market and
//! settlement-token contracts via alloy-rs 0.9. Reads go through
//! `eth_call` with hand-encoded calldata; writes go through the
//! wallet-filled provider, which signs and fills gas and nonce.
//!
//! The deployed market exists in two call shapes: one takes an
//! explicit expiry deadline on buy/sell, the other omits it. The
//! shape is selected in config and resolved entirely inside this
//! adapter, so the executor never sees the difference.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::config::{CallShape, ChainConfig};
use crate::domain::market::{MarketId, MarketStatus, PoolState, Side};
use crate::ports::ledger::{LedgerClient, TxConfirmation, TxId};

use super::contracts::{decode_words, Calldata, ContractAddresses};
use super::provider::EvmProvider;

/// `getPool` returns nine words: quantities, liquidity, vault, three
/// fee rates, status, and the per-trade impact cap.
const POOL_WORDS: usize = 9;

/// Ledger adapter over the deployed market and token contracts.
pub struct ChainLedger {
    /// Shared RPC provider (carries the signing wallet).
    provider: Arc<EvmProvider>,
    /// Contract addresses from config, validated at startup.
    addresses: ContractAddresses,
    /// Which buy/sell signature the deployed market expects.
    call_shape: CallShape,
    /// Expiry offset for the deadline call shape.
    deadline_ttl_secs: u64,
    /// How long `confirm` polls before giving up.
    confirm_timeout: Duration,
    /// Receipt poll interval.
    confirm_poll: Duration,
}

impl ChainLedger {
    /// Create a ledger adapter from a connected provider.
    pub fn new(
        provider: Arc<EvmProvider>,
        addresses: ContractAddresses,
        config: &ChainConfig,
    ) -> Self {
        Self {
            provider,
            addresses,
            call_shape: config.call_shape,
            deadline_ttl_secs: config.deadline_ttl_secs,
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            confirm_poll: Duration::from_millis(config.confirm_poll_ms),
        }
    }

    /// Read-only contract call.
    async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(Bytes::from(calldata).into());
        self.provider
            .inner()
            .call(&tx)
            .await
            .context("Contract call failed")
    }

    /// Sign and submit a state-changing transaction, returning its
    /// hash without waiting for inclusion.
    async fn send(&self, to: Address, calldata: Vec<u8>) -> Result<TxId> {
        let tx = TransactionRequest::default()
            .from(self.provider.wallet_address())
            .to(to)
            .input(Bytes::from(calldata).into());
        let pending = self
            .provider
            .inner()
            .send_transaction(tx)
            .await
            .context("Transaction submission failed")?;
        Ok(pending.tx_hash().to_string())
    }

    /// Expiry timestamp for the deadline call shape.
    fn deadline(&self) -> U256 {
        let now = Utc::now().timestamp().unsigned_abs();
        U256::from(now + self.deadline_ttl_secs)
    }

    fn trade_calldata(
        &self,
        verb: &str,
        market: B256,
        side: Side,
        amount_in: U256,
        min_out: U256,
    ) -> Vec<u8> {
        match self.call_shape {
            CallShape::Deadline => {
                let signature = format!("{verb}(bytes32,bool,uint256,uint256,uint256)");
                Calldata::new(&signature)
                    .bytes32(market)
                    .boolean(side == Side::Yes)
                    .uint(amount_in)
                    .uint(min_out)
                    .uint(self.deadline())
                    .build()
            }
            CallShape::Legacy => {
                let signature = format!("{verb}(bytes32,bool,uint256,uint256)");
                Calldata::new(&signature)
                    .bytes32(market)
                    .boolean(side == Side::Yes)
                    .uint(amount_in)
                    .uint(min_out)
                    .build()
            }
        }
    }
}

fn parse_market_id(market_id: &MarketId) -> Result<B256> {
    market_id
        .parse()
        .with_context(|| format!("Malformed market id {market_id:?}"))
}

fn parse_tx_id(tx: &TxId) -> Result<B256> {
    tx.parse()
        .with_context(|| format!("Malformed transaction id {tx:?}"))
}

/// Decode an unsigned word into `i128`, erroring on overflow rather
/// than wrapping into a negative quantity.
fn word_to_i128(word: U256, field: &str) -> Result<i128> {
    if word > U256::from(i128::MAX as u128) {
        bail!("Field {field} value {word} exceeds i128 range");
    }
    Ok(word.to::<u128>() as i128)
}

fn word_to_i64(word: U256, field: &str) -> Result<i64> {
    if word > U256::from(i64::MAX as u64) {
        bail!("Field {field} value {word} exceeds i64 range");
    }
    Ok(word.to::<u64>() as i64)
}

fn word_to_u16(word: U256, field: &str) -> Result<u16> {
    if word > U256::from(u16::MAX) {
        bail!("Field {field} value {word} exceeds u16 range");
    }
    Ok(word.to::<u16>())
}

fn word_to_status(word: U256) -> Result<MarketStatus> {
    match word.to::<u64>() {
        0 => Ok(MarketStatus::Active),
        1 => Ok(MarketStatus::Resolved),
        2 => Ok(MarketStatus::Cancelled),
        other => bail!("Unknown market status discriminant {other}"),
    }
}

#[async_trait]
impl LedgerClient for ChainLedger {
    #[instrument(skip(self), fields(market = %market_id))]
    async fn pool_state(&self, market_id: &MarketId) -> Result<PoolState> {
        let market = parse_market_id(market_id)?;
        let calldata = Calldata::new("getPool(bytes32)").bytes32(market).build();
        let result = self.call(self.addresses.market, calldata).await?;
        let words = decode_words(&result, POOL_WORDS)?;

        let pool = PoolState {
            market_id: market_id.clone(),
            q_yes: word_to_i128(words[0], "q_yes")?,
            q_no: word_to_i128(words[1], "q_no")?,
            b: word_to_i128(words[2], "b")?,
            vault_balance: word_to_i64(words[3], "vault_balance")?,
            fee_bps_treasury: word_to_u16(words[4], "fee_bps_treasury")?,
            fee_bps_vault: word_to_u16(words[5], "fee_bps_vault")?,
            fee_bps_lp: word_to_u16(words[6], "fee_bps_lp")?,
            status: word_to_status(words[7])?,
            max_impact_amount: word_to_i64(words[8], "max_impact_amount")?,
        };
        debug!(
            q_yes = pool.q_yes,
            q_no = pool.q_no,
            status = ?pool.status,
            "Pool state read"
        );
        Ok(pool)
    }

    async fn allowance(&self) -> Result<u128> {
        let calldata = Calldata::new("allowance(address,address)")
            .address(self.provider.wallet_address())
            .address(self.addresses.market)
            .build();
        let result = self.call(self.addresses.settlement_token, calldata).await?;
        let value = U256::from_be_slice(&result);
        // Unlimited approvals report max uint256; clamp to u128
        if value > U256::from(u128::MAX) {
            return Ok(u128::MAX);
        }
        Ok(value.to::<u128>())
    }

    async fn settlement_balance(&self) -> Result<i64> {
        let calldata = Calldata::new("balanceOf(address)")
            .address(self.provider.wallet_address())
            .build();
        let result = self.call(self.addresses.settlement_token, calldata).await?;
        word_to_i64(U256::from_be_slice(&result), "settlement_balance")
    }

    async fn share_balance(&self, market_id: &MarketId, side: Side) -> Result<i128> {
        let market = parse_market_id(market_id)?;
        let calldata = Calldata::new("shareBalance(bytes32,address,bool)")
            .bytes32(market)
            .address(self.provider.wallet_address())
            .boolean(side == Side::Yes)
            .build();
        let result = self.call(self.addresses.market, calldata).await?;
        word_to_i128(U256::from_be_slice(&result), "share_balance")
    }

    #[instrument(skip(self))]
    async fn approve_max(&self) -> Result<TxId> {
        let calldata = Calldata::new("approve(address,uint256)")
            .address(self.addresses.market)
            .uint(U256::MAX)
            .build();
        let tx = self.send(self.addresses.settlement_token, calldata).await?;
        info!(tx = %tx, spender = %self.addresses.market, "Max approval submitted");
        Ok(tx)
    }

    #[instrument(skip(self), fields(market = %market_id, %side, amount))]
    async fn submit_buy(
        &self,
        market_id: &MarketId,
        side: Side,
        amount: i64,
        min_shares: i128,
    ) -> Result<TxId> {
        let market = parse_market_id(market_id)?;
        anyhow::ensure!(amount > 0, "Buy amount must be positive");
        anyhow::ensure!(min_shares >= 0, "Minimum shares must be non-negative");
        let calldata = self.trade_calldata(
            "buy",
            market,
            side,
            U256::from(amount.unsigned_abs()),
            U256::from(min_shares.unsigned_abs()),
        );
        let tx = self.send(self.addresses.market, calldata).await?;
        info!(tx = %tx, "Buy submitted");
        Ok(tx)
    }

    #[instrument(skip(self), fields(market = %market_id, %side, shares))]
    async fn submit_sell(
        &self,
        market_id: &MarketId,
        side: Side,
        shares: i128,
        min_payout: i64,
    ) -> Result<TxId> {
        let market = parse_market_id(market_id)?;
        anyhow::ensure!(shares > 0, "Sell shares must be positive");
        anyhow::ensure!(min_payout >= 0, "Minimum payout must be non-negative");
        let calldata = self.trade_calldata(
            "sell",
            market,
            side,
            U256::from(shares.unsigned_abs()),
            U256::from(min_payout.unsigned_abs()),
        );
        let tx = self.send(self.addresses.market, calldata).await?;
        info!(tx = %tx, "Sell submitted");
        Ok(tx)
    }

    #[instrument(skip(self), fields(tx = %tx))]
    async fn confirm(&self, tx: &TxId) -> Result<TxConfirmation> {
        let hash = parse_tx_id(tx)?;
        let inner = self.provider.inner();
        let started = tokio::time::Instant::now();

        loop {
            if started.elapsed() > self.confirm_timeout {
                bail!(
                    "No receipt for {tx} after {}s",
                    self.confirm_timeout.as_secs()
                );
            }

            match inner.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    let confirmed = receipt.status();
                    let revert_reason =
                        (!confirmed).then(|| "execution reverted".to_string());
                    return Ok(TxConfirmation {
                        tx_id: tx.clone(),
                        confirmed,
                        block_number: receipt.block_number,
                        revert_reason,
                    });
                }
                Ok(None) => {
                    // Still pending
                    tokio::time::sleep(self.confirm_poll).await;
                }
                Err(e) => {
                    debug!(error = %e, "Receipt query failed, retrying");
                    tokio::time::sleep(self.confirm_poll).await;
                }
            }
        }
    }

    async fn is_healthy(&self) -> bool {
        self.provider.is_healthy().await
    }
}
