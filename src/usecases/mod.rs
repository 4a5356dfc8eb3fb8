//! Use Cases - Application Orchestration
//!
//! The engines that drive the bot: venue aggregation, risk scoring,
//! the gated swap pipeline, and the strategy mode control loop. These
//! depend on domain types and ports only, never on adapters.

pub mod aggregator;
pub mod executor;
pub mod mode_controller;
pub mod risk_engine;

pub use aggregator::{AggregatedPools, VenueAggregator};
pub use executor::{ExecutionCoordinator, SwapRequest};
pub use mode_controller::{
    ModeHandles, ModeSettlement, StrategyMetrics, StrategyModeController, TradeOutcome,
};
pub use risk_engine::{PortfolioAssessment, RiskAssessment, RiskEngine, TradeIntent};
