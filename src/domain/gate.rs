//! Liquidity gate — sequential pre-trade threshold checks.
//!
//! Checks run fail-fast in a fixed order: liquidity, volume, spread, then
//! (once a quote exists) price impact. The first violated threshold is
//! returned as structured data; later thresholds are not evaluated.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::TradeError;
use super::market::{PoolSnapshot, Quote};

/// The threshold a gate rejection cites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateThreshold {
    Liquidity,
    Volume,
    Spread,
    PriceImpact,
}

impl std::fmt::Display for GateThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Liquidity => write!(f, "liquidity"),
            Self::Volume => write!(f, "volume"),
            Self::Spread => write!(f, "spread"),
            Self::PriceImpact => write!(f, "price impact"),
        }
    }
}

/// Immutable gate thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateLimits {
    /// Minimum pool liquidity in USD.
    pub min_liquidity_usd: Decimal,
    /// Minimum 24h volume in USD.
    pub min_volume_24h: Decimal,
    /// Maximum spread fraction.
    pub max_spread: Decimal,
    /// Maximum price impact fraction.
    pub max_price_impact: Decimal,
}

impl Default for GateLimits {
    /// Production defaults: $100k liquidity, $50k volume, 1% spread,
    /// 2% price impact.
    fn default() -> Self {
        Self {
            min_liquidity_usd: dec!(100000),
            min_volume_24h: dec!(50000),
            max_spread: dec!(0.01),
            max_price_impact: dec!(0.02),
        }
    }
}

/// Fail-fast threshold gate over pool and quote data.
#[derive(Debug, Clone)]
pub struct LiquidityGate {
    limits: GateLimits,
}

impl LiquidityGate {
    /// Create a gate with the given immutable limits.
    pub fn new(limits: GateLimits) -> Self {
        Self { limits }
    }

    /// The configured limits.
    pub fn limits(&self) -> &GateLimits {
        &self.limits
    }

    /// Checks 1–3: liquidity, volume, spread — in that order, fail-fast.
    pub fn check_pool(&self, pool: &PoolSnapshot) -> Result<(), TradeError> {
        if pool.liquidity_usd < self.limits.min_liquidity_usd {
            return Err(TradeError::GateRejected {
                threshold: GateThreshold::Liquidity,
                limit: self.limits.min_liquidity_usd,
                observed: pool.liquidity_usd,
            });
        }
        if pool.volume_24h < self.limits.min_volume_24h {
            return Err(TradeError::GateRejected {
                threshold: GateThreshold::Volume,
                limit: self.limits.min_volume_24h,
                observed: pool.volume_24h,
            });
        }
        if pool.spread > self.limits.max_spread {
            return Err(TradeError::GateRejected {
                threshold: GateThreshold::Spread,
                limit: self.limits.max_spread,
                observed: pool.spread,
            });
        }
        Ok(())
    }

    /// Check 4: price impact of an obtained quote.
    pub fn check_quote(&self, quote: &Quote) -> Result<(), TradeError> {
        self.check_price_impact(Some(quote.price_impact))
    }

    /// Check a price impact estimate. `None` is the infinite-impact
    /// sentinel from the impact model and never passes.
    pub fn check_price_impact(&self, impact: Option<Decimal>) -> Result<(), TradeError> {
        let observed = impact.unwrap_or(Decimal::MAX);
        if observed > self.limits.max_price_impact {
            return Err(TradeError::GateRejected {
                threshold: GateThreshold::PriceImpact,
                limit: self.limits.max_price_impact,
                observed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(liquidity: Decimal, volume: Decimal, spread: Decimal) -> PoolSnapshot {
        PoolSnapshot {
            venue: "jupiter".to_string(),
            liquidity_usd: liquidity,
            volume_24h: volume,
            price: dec!(1.0),
            spread,
            base_reserves: dec!(1000000),
            quote_reserves: dec!(1000000),
        }
    }

    fn assert_rejects(result: Result<(), TradeError>, expected: GateThreshold) {
        match result {
            Err(TradeError::GateRejected { threshold, .. }) => {
                assert_eq!(threshold, expected);
            }
            other => panic!("expected {expected} rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_pool_within_limits_passes() {
        let gate = LiquidityGate::new(GateLimits::default());
        assert!(gate.check_pool(&pool(dec!(100000), dec!(50000), dec!(0.01))).is_ok());
    }

    #[test]
    fn test_rejects_low_liquidity_first() {
        let gate = LiquidityGate::new(GateLimits::default());
        // Volume also fails here, but liquidity is cited: order is fixed.
        let result = gate.check_pool(&pool(dec!(99999), dec!(1), dec!(0.5)));
        assert_rejects(result, GateThreshold::Liquidity);
    }

    #[test]
    fn test_rejects_low_volume() {
        let gate = LiquidityGate::new(GateLimits::default());
        let result = gate.check_pool(&pool(dec!(100000), dec!(49999), dec!(0.001)));
        assert_rejects(result, GateThreshold::Volume);
    }

    #[test]
    fn test_rejects_wide_spread() {
        let gate = LiquidityGate::new(GateLimits::default());
        let result = gate.check_pool(&pool(dec!(100000), dec!(50000), dec!(0.011)));
        assert_rejects(result, GateThreshold::Spread);
    }

    #[test]
    fn test_rejection_carries_limit_and_observed() {
        let gate = LiquidityGate::new(GateLimits::default());
        match gate.check_pool(&pool(dec!(99999), dec!(50000), dec!(0.001))) {
            Err(TradeError::GateRejected { limit, observed, .. }) => {
                assert_eq!(limit, dec!(100000));
                assert_eq!(observed, dec!(99999));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_price_impact_boundary() {
        let gate = LiquidityGate::new(GateLimits::default());
        assert!(gate.check_price_impact(Some(dec!(0.02))).is_ok());
        assert_rejects(
            gate.check_price_impact(Some(dec!(0.0201))),
            GateThreshold::PriceImpact,
        );
    }

    #[test]
    fn test_infinite_impact_sentinel_never_passes() {
        let gate = LiquidityGate::new(GateLimits::default());
        assert_rejects(gate.check_price_impact(None), GateThreshold::PriceImpact);
    }
}
