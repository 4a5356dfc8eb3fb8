//! Advisory Port - Opaque Strategy Recommendation Interface
//!
//! The mode controller consumes a qualitative recommendation produced by
//! an external model. The signal is advisory only: the controller applies
//! its own dwell-time and confidence gating, and a failed or malformed
//! signal is fail-safe (no switch, loop continues).

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::market::TradingMode;

/// Market condition scores fed into the advisory model.
#[derive(Debug, Clone, Default)]
pub struct MarketConditions {
    /// Opportunity score for routine DEX swapping.
    pub dex_score: Decimal,
    /// Opportunity score for opportunistic scanning.
    pub opportunistic_score: Decimal,
    /// Overall market volatility estimate.
    pub volatility: Decimal,
}

/// A mode recommendation from the advisory model.
#[derive(Debug, Clone)]
pub struct Advisory {
    /// Mode name as the model emitted it (validated by the controller).
    pub recommended_mode: String,
    /// Confidence in [0, 1]. Values outside the range are clamped by the
    /// controller, never trusted blindly.
    pub confidence: Decimal,
}

impl Advisory {
    /// Recommended mode parsed into the closed enumeration, `None` for
    /// unrecognized names.
    pub fn mode(&self) -> Option<TradingMode> {
        TradingMode::from_name(&self.recommended_mode)
    }
}

/// Trait for advisory signal sources.
#[async_trait]
pub trait AdvisorySource: Send + Sync + 'static {
    /// Ask for a mode recommendation given the current mode and market
    /// condition scores.
    ///
    /// # Errors
    /// Any failure is absorbed fail-safe by the controller: it logs,
    /// skips the evaluation, and keeps running.
    async fn recommend(
        &self,
        current_mode: TradingMode,
        conditions: &MarketConditions,
    ) -> anyhow::Result<Advisory>;
}
