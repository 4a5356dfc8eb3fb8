//! Risk Engine - Position and Portfolio Risk Scoring
//!
//! Scores individual positions and the whole portfolio, and validates
//! candidate trades against margin and size limits. Assessments are
//! ephemeral: recomputed from a portfolio snapshot on every call and
//! never treated as a durable source of truth.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::domain::error::TradeError;
use crate::domain::portfolio::{Portfolio, Position};

/// Risk scoring weights and scaling. Volatility dominates deliberately:
/// a large move against entry saturates the score long before size or
/// leverage do.
const VOLATILITY_WEIGHT: Decimal = dec!(0.8);
const LEVERAGE_WEIGHT: Decimal = dec!(0.15);
const SIZE_WEIGHT: Decimal = dec!(0.05);
const SCORE_SCALE: Decimal = dec!(2);
const VOLATILITY_SCALE: Decimal = dec!(15);
const SIZE_SCALE: Decimal = dec!(2);
const LEVERAGE_SCALE: Decimal = dec!(3);

/// Concentration threshold: one position above half of total notional.
const CONCENTRATION_LIMIT: Decimal = dec!(0.5);
/// Drawdown fraction that fires the drawdown warning.
const DRAWDOWN_LIMIT: Decimal = dec!(0.15);
/// Position count considered fully diversified.
const DIVERSIFICATION_TARGET: Decimal = dec!(10);

/// Risk metrics for a single position. Ephemeral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Composite risk score in [0, 1].
    pub risk_score: Decimal,
    /// Fraction of price movement available before liquidation.
    pub margin_ratio: Decimal,
    /// Estimated liquidation price.
    pub liquidation_price: Decimal,
    /// Position notional at the current mark.
    pub notional: Decimal,
    /// Margin the position requires at its leverage.
    pub margin_required: Decimal,
    /// Volatility component of the score.
    pub volatility_risk: Decimal,
}

/// Portfolio-level risk summary. Ephemeral.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioAssessment {
    /// Notional-weighted average of per-position risk scores.
    pub total_risk_score: Decimal,
    /// Per-symbol assessments.
    pub position_risks: HashMap<String, RiskAssessment>,
    /// Free collateral ratio below the margin floor.
    pub margin_warning: bool,
    /// One position above half of total notional.
    pub concentration_warning: bool,
    /// Drawdown from initial value above the limit.
    pub drawdown_warning: bool,
    /// Current drawdown fraction from initial value.
    pub drawdown: Decimal,
    /// 0 (no positions) to 1 (ten or more positions).
    pub diversification_score: Decimal,
    /// Actions derived from which warnings fired.
    pub recommended_actions: Vec<String>,
}

/// A candidate trade submitted for risk validation.
#[derive(Debug, Clone)]
pub struct TradeIntent {
    /// Trading pair symbol.
    pub symbol: String,
    /// Trade size in base units.
    pub size: Decimal,
    /// Expected execution price.
    pub price: Decimal,
}

impl TradeIntent {
    /// Notional value of the candidate trade.
    pub fn notional(&self) -> Decimal {
        self.size * self.price
    }
}

/// Risk engine with immutable configured limits.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    min_margin_ratio: Decimal,
    max_leverage: Decimal,
    max_position_size: Decimal,
    /// Optional per-symbol notional caps, stricter than the global cap.
    symbol_limits: HashMap<String, Decimal>,
}

impl RiskEngine {
    /// Create a risk engine from config.
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            min_margin_ratio: config.min_margin_ratio,
            max_leverage: config.max_leverage,
            max_position_size: config.max_position_size,
            symbol_limits: config.symbol_limits.clone(),
        }
    }

    /// Assess a single position.
    pub fn assess_position(&self, position: &Position) -> RiskAssessment {
        let notional = position.size * position.current_price;
        let margin_required = if position.leverage > Decimal::ZERO {
            notional / position.leverage
        } else {
            notional
        };

        let liquidation_price = if position.entry_price > Decimal::ZERO {
            position.entry_price * (Decimal::ONE - self.min_margin_ratio)
        } else {
            Decimal::ZERO
        };
        let margin_ratio = if position.current_price > Decimal::ZERO {
            (position.current_price - liquidation_price) / position.current_price
        } else {
            Decimal::ZERO
        };

        let price_change = if position.entry_price > Decimal::ZERO {
            (position.current_price - position.entry_price).abs() / position.entry_price
        } else {
            Decimal::ZERO
        };
        let volatility_risk = (price_change * VOLATILITY_SCALE).min(Decimal::ONE);
        let size_risk = (notional / self.max_position_size * SIZE_SCALE).min(Decimal::ONE);
        let leverage_risk =
            (position.leverage / self.max_leverage * LEVERAGE_SCALE).min(Decimal::ONE);

        let risk_score = ((VOLATILITY_WEIGHT * volatility_risk
            + LEVERAGE_WEIGHT * leverage_risk
            + SIZE_WEIGHT * size_risk)
            * SCORE_SCALE)
            .clamp(Decimal::ZERO, Decimal::ONE);

        RiskAssessment {
            risk_score,
            margin_ratio,
            liquidation_price,
            notional,
            margin_required,
            volatility_risk,
        }
    }

    /// Assess the whole portfolio.
    ///
    /// An empty portfolio returns the all-neutral default — zero scores,
    /// no warnings, and no division anywhere.
    pub fn assess_portfolio(&self, portfolio: &Portfolio) -> PortfolioAssessment {
        if portfolio.positions.is_empty() {
            return PortfolioAssessment::default();
        }

        let mut position_risks = HashMap::new();
        let mut weighted_score = Decimal::ZERO;
        let mut total_notional = Decimal::ZERO;
        let mut max_notional = Decimal::ZERO;

        for (symbol, position) in &portfolio.positions {
            let assessment = self.assess_position(position);
            weighted_score += assessment.risk_score * assessment.notional;
            total_notional += assessment.notional;
            max_notional = max_notional.max(assessment.notional);
            position_risks.insert(symbol.clone(), assessment);
        }

        let total_risk_score = if total_notional > Decimal::ZERO {
            weighted_score / total_notional
        } else {
            Decimal::ZERO
        };

        let margin_warning = if portfolio.total_value > Decimal::ZERO {
            portfolio.free_collateral / portfolio.total_value < self.min_margin_ratio
        } else {
            false
        };
        let concentration_warning = if total_notional > Decimal::ZERO {
            max_notional / total_notional > CONCENTRATION_LIMIT
        } else {
            false
        };

        let position_count = Decimal::from(portfolio.positions.len() as u64);
        let diversification_score = (position_count / DIVERSIFICATION_TARGET).min(Decimal::ONE);

        let drawdown = if portfolio.initial_value > Decimal::ZERO {
            (portfolio.initial_value - portfolio.total_value) / portfolio.initial_value
        } else {
            Decimal::ZERO
        };
        let drawdown_warning = drawdown > DRAWDOWN_LIMIT;

        let mut recommended_actions = Vec::new();
        if margin_warning {
            recommended_actions.push("reduce leverage".to_string());
        }
        if concentration_warning {
            recommended_actions.push("diversify positions".to_string());
        }

        PortfolioAssessment {
            total_risk_score,
            position_risks,
            margin_warning,
            concentration_warning,
            drawdown_warning,
            drawdown,
            diversification_score,
            recommended_actions,
        }
    }

    /// Validate a candidate trade against size and margin limits.
    ///
    /// Checks run in order: per-symbol notional cap, global notional cap,
    /// then margin against free collateral.
    pub fn validate_trade(
        &self,
        trade: &TradeIntent,
        portfolio: &Portfolio,
    ) -> Result<(), TradeError> {
        let notional = trade.notional();

        if let Some(&limit) = self.symbol_limits.get(&trade.symbol) {
            if notional > limit {
                return Err(TradeError::RiskRejected {
                    reason: format!(
                        "notional {notional} exceeds {} limit {limit}",
                        trade.symbol
                    ),
                });
            }
        }

        if notional > self.max_position_size {
            return Err(TradeError::RiskRejected {
                reason: format!(
                    "notional {notional} exceeds max position size {}",
                    self.max_position_size
                ),
            });
        }

        let margin_required = notional / self.max_leverage;
        if margin_required > portfolio.free_collateral {
            return Err(TradeError::RiskRejected {
                reason: format!(
                    "required margin {margin_required} exceeds free collateral {}",
                    portfolio.free_collateral
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn engine() -> RiskEngine {
        RiskEngine::new(&RiskConfig {
            min_margin_ratio: dec!(0.1),
            max_leverage: dec!(5),
            max_position_size: dec!(100000),
            initial_portfolio_value: dec!(1000000),
            symbol_limits: HashMap::from([("SOL/USDC".to_string(), dec!(500))]),
        })
    }

    fn position(size: Decimal, entry: Decimal, current: Decimal, leverage: Decimal) -> Position {
        Position {
            symbol: "SOL/USDC".to_string(),
            size,
            entry_price: entry,
            current_price: current,
            leverage,
            opened_at: Utc::now(),
            unrealized_pnl: (current - entry) * size,
        }
    }

    #[test]
    fn test_position_assessment_formulas() {
        let assessment = engine().assess_position(&position(dec!(10), dec!(100), dec!(110), dec!(2)));
        assert_eq!(assessment.notional, dec!(1100));
        assert_eq!(assessment.margin_required, dec!(550));
        assert_eq!(assessment.liquidation_price, dec!(90));
        // (110 - 90) / 110
        assert!((assessment.margin_ratio - dec!(0.1818)).abs() < dec!(0.001));
        // 10% move * 15 saturates volatility risk; composite saturates too.
        assert_eq!(assessment.volatility_risk, Decimal::ONE);
        assert_eq!(assessment.risk_score, Decimal::ONE);
    }

    #[test]
    fn test_flat_position_scores_low() {
        let assessment = engine().assess_position(&position(dec!(1), dec!(100), dec!(100), dec!(1)));
        // No price move: only leverage (0.6) and size (0.004) contribute.
        assert_eq!(assessment.volatility_risk, Decimal::ZERO);
        assert!(assessment.risk_score < dec!(0.2), "got {}", assessment.risk_score);
    }

    #[test]
    fn test_zero_current_price_margin_ratio_is_zero() {
        let assessment = engine().assess_position(&position(dec!(1), dec!(100), dec!(0), dec!(1)));
        assert_eq!(assessment.margin_ratio, Decimal::ZERO);
    }

    #[test]
    fn test_empty_portfolio_is_neutral() {
        let assessment = engine().assess_portfolio(&Portfolio::with_initial_value(dec!(100000)));
        assert_eq!(assessment.total_risk_score, Decimal::ZERO);
        assert!(assessment.position_risks.is_empty());
        assert!(!assessment.margin_warning);
        assert!(!assessment.concentration_warning);
        assert!(!assessment.drawdown_warning);
        assert!(assessment.recommended_actions.is_empty());
    }

    #[test]
    fn test_concentration_warning_and_recommendation() {
        let mut portfolio = Portfolio::with_initial_value(dec!(100000));
        portfolio.apply_fill("SOL/USDC", dec!(100), dec!(10), dec!(1));
        portfolio.apply_fill("BONK/USDC", dec!(10), dec!(1), dec!(1));
        let assessment = engine().assess_portfolio(&portfolio);
        assert!(assessment.concentration_warning);
        assert!(assessment
            .recommended_actions
            .contains(&"diversify positions".to_string()));
    }

    #[test]
    fn test_drawdown_warning() {
        let mut portfolio = Portfolio::with_initial_value(dec!(100000));
        portfolio.total_value = dec!(80000);
        portfolio.apply_fill("SOL/USDC", dec!(1), dec!(10), dec!(1));
        let assessment = engine().assess_portfolio(&portfolio);
        assert_eq!(assessment.drawdown, dec!(0.2));
        assert!(assessment.drawdown_warning);
    }

    #[test]
    fn test_diversification_score_caps_at_one() {
        let mut portfolio = Portfolio::with_initial_value(dec!(100000));
        for i in 0..12 {
            portfolio.apply_fill(&format!("TOK{i}/USDC"), dec!(1), dec!(10), dec!(1));
        }
        let assessment = engine().assess_portfolio(&portfolio);
        assert_eq!(assessment.diversification_score, Decimal::ONE);
    }

    #[test]
    fn test_validate_trade_symbol_limit() {
        let portfolio = Portfolio::with_initial_value(dec!(100000));
        let trade = TradeIntent {
            symbol: "SOL/USDC".to_string(),
            size: dec!(100),
            price: dec!(10),
        };
        // 1000 notional > 500 symbol limit.
        assert!(matches!(
            engine().validate_trade(&trade, &portfolio),
            Err(TradeError::RiskRejected { .. })
        ));
    }

    #[test]
    fn test_validate_trade_global_limit() {
        let portfolio = Portfolio::with_initial_value(dec!(10000000));
        let trade = TradeIntent {
            symbol: "BONK/USDC".to_string(),
            size: dec!(200000),
            price: dec!(1),
        };
        assert!(matches!(
            engine().validate_trade(&trade, &portfolio),
            Err(TradeError::RiskRejected { .. })
        ));
    }

    #[test]
    fn test_validate_trade_margin_limit() {
        let mut portfolio = Portfolio::with_initial_value(dec!(100000));
        portfolio.free_collateral = dec!(100);
        let trade = TradeIntent {
            symbol: "BONK/USDC".to_string(),
            size: dec!(5000),
            price: dec!(1),
        };
        // margin = 5000 / 5 = 1000 > 100 free collateral.
        assert!(matches!(
            engine().validate_trade(&trade, &portfolio),
            Err(TradeError::RiskRejected { .. })
        ));
    }

    #[test]
    fn test_validate_trade_approves_within_limits() {
        let portfolio = Portfolio::with_initial_value(dec!(100000));
        let trade = TradeIntent {
            symbol: "BONK/USDC".to_string(),
            size: dec!(100),
            price: dec!(1),
        };
        assert!(engine().validate_trade(&trade, &portfolio).is_ok());
    }
}
