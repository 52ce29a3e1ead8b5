//! Domain layer - Core pricing and planning logic.
//!
//! This module contains the pure engine logic: fixed-point numeric
//! kernel, LMSR cost/price model, fee splits, the trade solver, and
//! the impact-guard chunk planner. No I/O happens here (hexagonal
//! architecture inner ring): everything takes an explicit `PoolState`
//! snapshot and is testable in isolation.

pub mod chunks;
pub mod fees;
pub mod fixed;
pub mod lmsr;
pub mod market;
pub mod solver;

// Re-export core types for convenience
pub use chunks::{ChunkPlan, PlanPreview};
pub use fees::{FeeBreakdown, FeeSchedule};
pub use fixed::NumericError;
pub use lmsr::CostModel;
pub use market::{
    Direction, MarketId, MarketStatus, PoolState, Side, SimulationResult, TradeRequest,
    TradeSimulation,
};
pub use solver::SolverError;
