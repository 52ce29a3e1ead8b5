//! Usecases Layer - Application Orchestration
//!
//! Coordinates the domain layer with the ports. The executor owns the
//! full life of a trade attempt: allowance, chunked simulation,
//! submission, and confirmation.

pub mod executor;

pub use executor::{
  ExecutionError, ExecutionFailure, ExecutionReport, ExecutionState, TradeExecutor,
};
