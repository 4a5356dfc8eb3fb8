//! Position sizing.
//!
//! Computes a trade size from the configured base size, risk factor and
//! leverage, optionally splitting it into staged entries paired with
//! profit targets.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::TradeError;

/// Size reduction applied when volatility adjustment is enabled.
const VOLATILITY_FACTOR: Decimal = dec!(0.8);

/// Immutable sizing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingParams {
    /// Base position size in quote currency.
    pub base_size: Decimal,
    /// Multiplier applied to the base size.
    pub size_multiplier: Decimal,
    /// Cap as a fraction of the global max position size.
    pub max_position_percent: Decimal,
    /// Scale size by the caller's risk factor.
    pub risk_based_sizing: bool,
    /// Reduce size by 20% in volatile conditions.
    pub volatility_adjustment: bool,
    /// Split the position into staged entries.
    pub staged_entry: bool,
    /// Fraction of total size per entry stage.
    pub entry_stages: Vec<Decimal>,
    /// Price multiplier targets for taking profit, paired with stages.
    pub profit_targets: Vec<Decimal>,
    /// Fraction of the position to unwind at each target.
    pub size_per_stage: Vec<Decimal>,
}

impl Default for SizingParams {
    fn default() -> Self {
        Self {
            base_size: dec!(1000),
            size_multiplier: dec!(1.0),
            max_position_percent: dec!(0.2),
            risk_based_sizing: true,
            volatility_adjustment: true,
            staged_entry: false,
            entry_stages: vec![dec!(0.5), dec!(0.3), dec!(0.2)],
            profit_targets: vec![dec!(2.0), dec!(3.0), dec!(5.0)],
            size_per_stage: vec![dec!(0.2), dec!(0.25), dec!(0.2)],
        }
    }
}

/// One staged entry slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryStage {
    /// Size allocated to this stage.
    pub size: Decimal,
    /// Entry price for the stage.
    pub entry_price: Decimal,
    /// Price at which profit is taken for this stage.
    pub target_price: Decimal,
    /// Fraction of the position unwound at the target (reporting weight).
    pub size_fraction: Decimal,
}

/// Sizing result: total size plus optional staged breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSize {
    /// Final position size after all adjustments.
    pub total_size: Decimal,
    /// Staged entries, present only when staged entry is enabled.
    pub stages: Option<Vec<EntryStage>>,
    /// Risk factor the caller supplied.
    pub risk_factor: Decimal,
    /// Leverage the caller supplied.
    pub leverage: Decimal,
    /// The cap that applied (`max_position_size * max_position_percent`).
    pub max_size: Decimal,
}

/// Position sizer with immutable configuration.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    params: SizingParams,
    /// Global notional cap (shared with the risk engine).
    max_position_size: Decimal,
    /// Maximum permitted leverage.
    max_leverage: Decimal,
}

impl PositionSizer {
    pub fn new(params: SizingParams, max_position_size: Decimal, max_leverage: Decimal) -> Self {
        Self {
            params,
            max_position_size,
            max_leverage,
        }
    }

    /// Compute the position size for a trade.
    ///
    /// All inputs are validated before any arithmetic: empty symbol,
    /// non-positive price, risk factor outside (0, 1] or leverage outside
    /// [1, max_leverage] reject with `TradeError::Validation`.
    pub fn size(
        &self,
        symbol: &str,
        price: Decimal,
        risk_factor: Decimal,
        leverage: Decimal,
    ) -> Result<PositionSize, TradeError> {
        if symbol.is_empty() {
            return Err(TradeError::validation("symbol", "symbol must not be empty"));
        }
        if price <= Decimal::ZERO {
            return Err(TradeError::validation(
                "price",
                format!("price must be positive, got {price}"),
            ));
        }
        if risk_factor <= Decimal::ZERO || risk_factor > Decimal::ONE {
            return Err(TradeError::validation(
                "risk_factor",
                format!("risk factor must be in (0, 1], got {risk_factor}"),
            ));
        }
        if leverage < Decimal::ONE || leverage > self.max_leverage {
            return Err(TradeError::validation(
                "leverage",
                format!("leverage must be in [1, {}], got {leverage}", self.max_leverage),
            ));
        }

        let base = self.params.base_size * self.params.size_multiplier;
        let max_size = self.max_position_size * self.params.max_position_percent;
        let mut size = base.min(max_size);

        if self.params.risk_based_sizing {
            size *= risk_factor;
        }

        size /= leverage;

        if self.params.volatility_adjustment {
            size *= VOLATILITY_FACTOR;
        }

        let stages = self.params.staged_entry.then(|| self.build_stages(size, price));

        Ok(PositionSize {
            total_size: size,
            stages,
            risk_factor,
            leverage,
            max_size,
        })
    }

    /// Pair entry stages with profit targets and per-stage weights.
    ///
    /// Stage count is the shortest of the three configured lists; a length
    /// mismatch truncates silently here and is warned about once at config
    /// validation time.
    fn build_stages(&self, total_size: Decimal, price: Decimal) -> Vec<EntryStage> {
        self.params
            .entry_stages
            .iter()
            .zip(&self.params.profit_targets)
            .zip(&self.params.size_per_stage)
            .map(|((&stage_pct, &target_mult), &size_pct)| EntryStage {
                size: total_size * stage_pct,
                entry_price: price,
                target_price: price * target_mult,
                size_fraction: size_pct,
            })
            .collect()
    }
}
