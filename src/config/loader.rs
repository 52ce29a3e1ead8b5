//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{CallShape, EngineConfig};

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<EngineConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: EngineConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    markets = config.markets.len(),
    safety_margin_bps = config.trading.safety_margin_bps,
    call_shape = ?config.chain.call_shape,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &EngineConfig) -> Result<()> {
  // Market validation
  anyhow::ensure!(
    !config.markets.is_empty(),
    "At least one market must be configured"
  );

  for (i, market) in config.markets.iter().enumerate() {
    anyhow::ensure!(
      market.market_id.starts_with("0x") && market.market_id.len() == 66,
      "Market {} ({}) has malformed market_id (expected 0x-prefixed bytes32)",
      i,
      market.name
    );
  }

  // Trading validation
  anyhow::ensure!(
    config.trading.safety_margin_bps > 0 && config.trading.safety_margin_bps <= 10_000,
    "safety_margin_bps must be in (0, 10000], got {}",
    config.trading.safety_margin_bps
  );
  anyhow::ensure!(
    config.trading.default_slippage_bps < 10_000,
    "default_slippage_bps must be below 10000, got {}",
    config.trading.default_slippage_bps
  );
  anyhow::ensure!(
    config.trading.poll_interval_secs > 0,
    "poll_interval_secs must be positive"
  );

  // Chain validation
  anyhow::ensure!(!config.chain.rpc_url.is_empty(), "RPC URL must not be empty");
  anyhow::ensure!(config.chain.chain_id > 0, "chain_id must be positive");
  for (name, addr) in [
    ("market_contract", &config.chain.market_contract),
    ("settlement_token", &config.chain.settlement_token),
  ] {
    anyhow::ensure!(
      addr.starts_with("0x") && addr.len() == 42,
      "{name} must be a 0x-prefixed 20-byte address, got {addr:?}"
    );
  }
  if config.chain.call_shape == CallShape::Deadline {
    anyhow::ensure!(
      config.chain.deadline_ttl_secs > 0,
      "deadline_ttl_secs must be positive for the deadline call shape"
    );
  }
  anyhow::ensure!(
    config.chain.confirm_timeout_secs > 0,
    "confirm_timeout_secs must be positive"
  );
  anyhow::ensure!(
    config.chain.confirm_poll_ms > 0,
    "confirm_poll_ms must be positive"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const VALID: &str = r#"
    [engine]
    name = "lmsr-engine"

    [[markets]]
    name = "btc-100k"
    market_id = "0x1111111111111111111111111111111111111111111111111111111111111111"

    [trading]

    [chain]
    rpc_url = "https://rpc.example.org"
    chain_id = 137
    market_contract = "0x2222222222222222222222222222222222222222"
    settlement_token = "0x3333333333333333333333333333333333333333"
  "#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_valid_config_parses_with_defaults() {
    let config: EngineConfig = toml::from_str(VALID).unwrap();
    validate_config(&config).unwrap();
    assert_eq!(config.trading.safety_margin_bps, 9_800);
    assert_eq!(config.trading.default_slippage_bps, 100);
    assert_eq!(config.chain.call_shape, CallShape::Deadline);
    assert!(config.health.enabled);
  }

  #[test]
  fn test_zero_margin_rejected() {
    let mut config: EngineConfig = toml::from_str(VALID).unwrap();
    config.trading.safety_margin_bps = 0;
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_malformed_market_id_rejected() {
    let mut config: EngineConfig = toml::from_str(VALID).unwrap();
    config.markets[0].market_id = "not-hex".to_string();
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_malformed_contract_address_rejected() {
    let mut config: EngineConfig = toml::from_str(VALID).unwrap();
    config.chain.market_contract = "0x123".to_string();
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_legacy_call_shape_parses() {
    let toml_str = VALID.replace(
      "[chain]",
      "[chain]\n    call_shape = \"legacy\"",
    );
    let config: EngineConfig = toml::from_str(&toml_str).unwrap();
    assert_eq!(config.chain.call_shape, CallShape::Legacy);
    validate_config(&config).unwrap();
  }
}
