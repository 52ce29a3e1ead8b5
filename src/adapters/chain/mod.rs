//! Chain Adapters - Ledger Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - RPC provider management with wallet-backed signing
//! - Contract address validation and ABI calldata encoding
//! - The `LedgerClient` port implementation (reads, trades, receipts)

pub mod contracts;
pub mod ledger;
pub mod provider;

pub use contracts::ContractAddresses;
pub use ledger::ChainLedger;
pub use provider::EvmProvider;
