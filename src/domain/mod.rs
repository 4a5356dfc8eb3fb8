//! Domain layer - Core business logic and models.
//!
//! Pure trading logic for the multi-venue swap agent. No I/O allowed here
//! (hexagonal architecture inner ring); everything is testable in
//! isolation and all financial values are `rust_decimal::Decimal`.

pub mod error;
pub mod gate;
pub mod impact;
pub mod market;
pub mod pair;
pub mod portfolio;
pub mod sizing;

// Re-export core types for convenience
pub use error::TradeError;
pub use gate::{GateLimits, GateThreshold, LiquidityGate};
pub use market::{PoolSnapshot, Quote, SwapFill, SwapReceipt, SwapStatus, TradingMode};
pub use pair::TokenPair;
pub use portfolio::{Portfolio, Position};
pub use sizing::{EntryStage, PositionSize, PositionSizer, SizingParams};
