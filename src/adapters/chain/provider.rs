//! EVM RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Manages the connection to the ledger chain via alloy-rs. Validates
//! RPC connectivity and chain id at startup and exposes a shared
//! provider instance for all on-chain operations.
//!
//! In alloy 0.9, `ProviderBuilder::new().wallet(..).on_http()` returns
//! a complex filler type. We store it as a type-erased `dyn Provider`
//! to keep the API clean across the adapter layer.

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::ChainConfig;

/// Shared EVM RPC provider backed by alloy-rs 0.9.
///
/// All chain adapters share a single provider instance to avoid
/// redundant connections and enable connection pooling. The provider
/// carries the engine's wallet, so transaction fills (nonce, gas,
/// signature) happen transparently on submission.
///
/// Uses `dyn Provider` for type erasure because alloy 0.9's builder
/// returns a deeply-nested generic filler type that would leak
/// implementation details.
pub struct EvmProvider {
    /// The alloy HTTP provider connected to the RPC (type-erased).
    provider: Arc<dyn Provider + Send + Sync>,
    /// Address of the engine's signing wallet.
    wallet_address: Address,
    /// RPC endpoint URL (for diagnostics, never logged with secrets).
    #[allow(dead_code)]
    rpc_url: String,
}

impl EvmProvider {
    /// Connect to the RPC and validate the chain id.
    ///
    /// The RPC URL and expected chain id come from `config.toml`
    /// (never hardcoded). The signing key comes from the
    /// `PRIVATE_KEY` environment variable - it is never written to
    /// config files or logs.
    #[instrument(skip_all)]
    pub async fn connect(config: &ChainConfig) -> Result<Self> {
        let rpc_url = config.rpc_url.clone();

        let key = std::env::var("PRIVATE_KEY").context("PRIVATE_KEY not set")?;
        let signer: PrivateKeySigner = key.parse().context("Invalid PRIVATE_KEY")?;
        let wallet_address = signer.address();
        let wallet = EthereumWallet::from(signer);

        // alloy 0.9: on_builtin() boxes the transport, so the result
        // coerces to `dyn Provider` (whose default transport is BoxTransport)
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .on_builtin(&rpc_url)
            .await
            .context("Invalid RPC URL")?;

        // Wrap in Arc<dyn Provider> for type erasure
        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        // Validate chain id at startup
        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if chain_id != config.chain_id {
            anyhow::bail!(
                "Expected chain_id={}, got {chain_id} — check rpc_url in config.toml",
                config.chain_id
            );
        }

        info!(chain_id, wallet = %wallet_address, "Connected to ledger RPC");

        Ok(Self {
            provider,
            wallet_address,
            rpc_url,
        })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    /// Address of the engine's signing wallet.
    pub fn wallet_address(&self) -> Address {
        self.wallet_address
    }

    /// Check if the RPC connection is healthy via a lightweight call.
    pub async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
