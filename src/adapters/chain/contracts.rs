//! Contract Bindings - Addresses and ABI Encoding Helpers
//!
//! Holds the deployed contract addresses (loaded from `config.toml`,
//! validated on-chain at startup) and the hand-rolled ABI encoding
//! used by the ledger adapter. Calldata is built from keccak selectors
//! plus left-padded 32-byte words, matching the solidity ABI without
//! pulling in a codegen layer for a handful of functions.

use std::sync::Arc;

use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::providers::Provider;
use anyhow::{bail, Context, Result};
use tracing::{info, instrument};

use crate::config::ChainConfig;

/// Market and token contract addresses loaded from config.
#[derive(Debug, Clone)]
pub struct ContractAddresses {
    /// LMSR market (AMM) contract.
    pub market: Address,
    /// Settlement token (6-decimal stablecoin) contract.
    pub settlement_token: Address,
}

impl ContractAddresses {
    /// Parse addresses out of the chain config.
    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        let market: Address = config
            .market_contract
            .parse()
            .context("Invalid market_contract address")?;
        let settlement_token: Address = config
            .settlement_token
            .parse()
            .context("Invalid settlement_token address")?;
        Ok(Self {
            market,
            settlement_token,
        })
    }

    /// Validate that each configured address has deployed code.
    ///
    /// This prevents misconfiguration from silently failing at runtime
    /// with empty-return decoding errors.
    #[instrument(skip_all)]
    pub async fn validate_deployed(
        &self,
        provider: Arc<dyn Provider + Send + Sync>,
    ) -> Result<()> {
        for (name, addr) in [
            ("Market", self.market),
            ("SettlementToken", self.settlement_token),
        ] {
            let code = provider
                .get_code_at(addr)
                .await
                .context(format!("Failed to query code for {name}"))?;

            if code.is_empty() {
                bail!(
                    "Contract {name} at {} has no deployed code — check config.toml",
                    addr
                );
            }

            info!(contract = name, address = %addr, "Validated on-chain");
        }
        Ok(())
    }
}

/// First four bytes of the keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Incremental ABI calldata builder: selector plus 32-byte words.
pub struct Calldata {
    bytes: Vec<u8>,
}

impl Calldata {
    pub fn new(signature: &str) -> Self {
        let mut bytes = Vec::with_capacity(4 + 32 * 5);
        bytes.extend_from_slice(&selector(signature));
        Self { bytes }
    }

    /// Append a left-padded address word.
    pub fn address(mut self, addr: Address) -> Self {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(addr.as_slice());
        self.bytes.extend_from_slice(&word);
        self
    }

    /// Append a raw bytes32 word.
    pub fn bytes32(mut self, value: B256) -> Self {
        self.bytes.extend_from_slice(value.as_slice());
        self
    }

    /// Append a uint256 word.
    pub fn uint(mut self, value: U256) -> Self {
        self.bytes.extend_from_slice(&value.to_be_bytes::<32>());
        self
    }

    /// Append a bool word (0 or 1, right-aligned).
    pub fn boolean(mut self, value: bool) -> Self {
        let mut word = [0u8; 32];
        word[31] = u8::from(value);
        self.bytes.extend_from_slice(&word);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Split a raw `eth_call` return into 32-byte words.
///
/// Errors if the payload is not word-aligned or has fewer words than
/// the caller expects, which is the symptom of calling the wrong
/// contract or the wrong function.
pub fn decode_words(data: &[u8], expected: usize) -> Result<Vec<U256>> {
    if data.len() % 32 != 0 {
        bail!("Return data length {} is not word-aligned", data.len());
    }
    let words: Vec<U256> = data
        .chunks_exact(32)
        .map(U256::from_be_slice)
        .collect();
    if words.len() < expected {
        bail!(
            "Return data has {} words, expected at least {expected}",
            words.len()
        );
    }
    Ok(words)
}
