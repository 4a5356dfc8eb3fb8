//! Heuristic Advisory - Condition-Score Recommendation
//!
//! Stand-in for an external strategy advisor. Recommends whichever mode
//! the condition scores favor, with confidence proportional to how far
//! apart the scores are. A remote advisor (model endpoint, operator
//! console) slots in behind the same port.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::market::TradingMode;
use crate::ports::advisory::{Advisory, AdvisorySource, MarketConditions};

/// Advisory source derived purely from the scanned condition scores.
#[derive(Debug, Default)]
pub struct HeuristicAdvisory;

#[async_trait]
impl AdvisorySource for HeuristicAdvisory {
    async fn recommend(
        &self,
        _current_mode: TradingMode,
        conditions: &MarketConditions,
    ) -> anyhow::Result<Advisory> {
        let (mode, margin) = if conditions.dex_score >= conditions.opportunistic_score {
            (
                TradingMode::DexSwap,
                conditions.dex_score - conditions.opportunistic_score,
            )
        } else {
            (
                TradingMode::Opportunistic,
                conditions.opportunistic_score - conditions.dex_score,
            )
        };

        // A split decision carries half confidence; a unanimous scan
        // carries full confidence.
        let confidence =
            (Decimal::ONE + margin.clamp(Decimal::ZERO, Decimal::ONE)) / Decimal::from(2);

        Ok(Advisory {
            recommended_mode: mode.to_string(),
            confidence,
        })
    }
}
