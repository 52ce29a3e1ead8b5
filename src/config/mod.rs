//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides via `.env` files. All contract
//! addresses and trading parameters are externalized here - nothing
//! is hardcoded in the domain layer.

pub mod loader;

use serde::Deserialize;

/// Top-level engine configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the engine begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Engine identity and metadata.
  pub engine: EngineSettings,
  /// Market definitions.
  pub markets: Vec<MarketConfig>,
  /// Trade sizing and protection parameters.
  pub trading: TradingConfig,
  /// Ledger / chain connection parameters.
  pub chain: ChainConfig,
  /// Health endpoint configuration.
  #[serde(default)]
  pub health: HealthConfig,
}

/// Engine identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
  /// Human-readable engine name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Dry-run mode: simulate and plan but never submit transactions.
  #[serde(default)]
  pub dry_run: bool,
}

/// Individual market configuration.
///
/// Each market maps a human name to its ledger identifier.
/// Identifiers are ALWAYS in config - never hardcoded.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
  /// Human-readable market name.
  pub name: String,
  /// Ledger market identifier (bytes32 hex).
  pub market_id: String,
  /// Whether this market is actively quoted.
  #[serde(default = "default_true")]
  pub active: bool,
}

/// Trade sizing and protection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
  /// Safety margin applied to the per-trade impact cap when chunking,
  /// in basis points (9800 = chunks sized to 98% of the cap).
  #[serde(default = "default_safety_margin")]
  pub safety_margin_bps: u16,
  /// Default slippage tolerance for requests that do not set one.
  #[serde(default = "default_slippage")]
  pub default_slippage_bps: u16,
  /// Pool-state poll interval for the quoting loop (seconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_secs: u64,
}

/// Which call shape the deployed market contract expects.
///
/// One deployment variant takes an explicit expiry deadline on
/// buy/sell; the other omits it. Selecting the shape here keeps the
/// executor's sequencing logic shape-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallShape {
  /// `buy(marketId, isYes, amount, minOut, deadline)` variant.
  Deadline,
  /// `buy(marketId, isYes, amount, minOut)` variant.
  Legacy,
}

/// Ledger / chain connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// JSON-RPC endpoint.
  pub rpc_url: String,
  /// Expected chain id, validated at connect time.
  pub chain_id: u64,
  /// Market (LMSR AMM) contract address.
  pub market_contract: String,
  /// Settlement token (6-decimal stablecoin) contract address.
  pub settlement_token: String,
  /// Call shape of the deployed market contract.
  #[serde(default = "default_call_shape")]
  pub call_shape: CallShape,
  /// Transaction expiry offset for the deadline call shape (seconds).
  #[serde(default = "default_deadline_ttl")]
  pub deadline_ttl_secs: u64,
  /// How long to wait for a transaction receipt before giving up.
  #[serde(default = "default_confirm_timeout")]
  pub confirm_timeout_secs: u64,
  /// Receipt poll interval (milliseconds).
  #[serde(default = "default_confirm_poll")]
  pub confirm_poll_ms: u64,
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
  /// Enable the /live and /ready probes.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Health server port.
  #[serde(default = "default_health_port")]
  pub port: u16,
}

impl Default for HealthConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      port: default_health_port(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_safety_margin() -> u16 {
  9_800
}

fn default_slippage() -> u16 {
  100
}

fn default_poll_interval() -> u64 {
  30
}

fn default_call_shape() -> CallShape {
  CallShape::Deadline
}

fn default_deadline_ttl() -> u64 {
  300
}

fn default_confirm_timeout() -> u64 {
  120
}

fn default_confirm_poll() -> u64 {
  1_500
}

fn default_health_port() -> u16 {
  9_090
}
