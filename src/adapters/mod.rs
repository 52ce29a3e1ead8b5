//! Adapters Layer - Concrete Implementations of Ports
//!
//! Each adapter implements one or more port traits against a real
//! external system:
//! - `chain`: ledger access via alloy-rs 0.9 (`LedgerClient`)
//! - `health`: axum liveness/readiness probes

pub mod chain;
pub mod health;
