//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `LedgerClient`: the external ledger/contract boundary — pool
//!   state reads, allowance/balance queries, and trade submission

pub mod ledger;
