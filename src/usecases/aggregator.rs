//! Venue Aggregator - Concurrent Multi-Venue Quote Selection
//!
//! Fans a request out to every enabled provider concurrently, waits for
//! all of them to complete (gather, tolerate partial failure — never a
//! race that discards slow-but-successful venues), discards per-venue
//! failures after logging, and selects the best result deterministically.
//!
//! Tie-break rule: providers are held in explicit registration order
//! (the `[[venues]]` order in config.toml). Selection scans results in
//! that order using strict comparison, so the earliest-registered venue
//! wins ties regardless of concurrent completion order.

use std::sync::Arc;

use futures_util::future::join_all;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::error::TradeError;
use crate::domain::market::{PoolSnapshot, Quote};
use crate::domain::pair::TokenPair;
use crate::ports::quote_provider::QuoteProvider;

/// Pool information aggregated across venues.
#[derive(Debug, Clone)]
pub struct AggregatedPools {
    /// The pair the snapshots describe.
    pub pair: TokenPair,
    /// Per-venue snapshots, in provider registration order.
    pub pools: Vec<PoolSnapshot>,
}

impl AggregatedPools {
    /// The snapshot with maximum liquidity; registration order breaks ties.
    pub fn best_liquidity(&self) -> &PoolSnapshot {
        // Non-empty by construction (pool_info fails with NoLiquidityData
        // instead of returning an empty aggregate).
        self.pools
            .iter()
            .reduce(|best, candidate| {
                if candidate.liquidity_usd > best.liquidity_usd {
                    candidate
                } else {
                    best
                }
            })
            .expect("AggregatedPools is never empty")
    }
}

/// Aggregator over an ordered registry of quote providers.
pub struct VenueAggregator {
    /// Providers in registration order. Earlier = higher tie-break priority.
    providers: Vec<Arc<dyn QuoteProvider>>,
}

impl VenueAggregator {
    /// Create an aggregator over providers in registration order.
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        Self { providers }
    }

    /// Venue ids in registration order.
    pub fn venues(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.venue()).collect()
    }

    /// Look up a provider by venue id (used to execute a winning quote).
    pub fn provider(&self, venue: &str) -> Option<&Arc<dyn QuoteProvider>> {
        self.providers.iter().find(|p| p.venue() == venue)
    }

    /// Check every provider concurrently; true while at least one venue
    /// answers its health check. Trading survives partial outages, so
    /// readiness does too.
    pub async fn any_healthy(&self) -> bool {
        let checks = self.providers.iter().map(|provider| provider.is_healthy());
        join_all(checks).await.into_iter().any(|healthy| healthy)
    }

    /// Fetch quotes from every provider concurrently and return the one
    /// with minimum price impact.
    ///
    /// Per-venue failures are logged and discarded; only when no venue
    /// succeeds does this fail, with `TradeError::NoQuote`.
    pub async fn best_quote(
        &self,
        input_token: &str,
        output_token: &str,
        amount: Decimal,
    ) -> Result<Quote, TradeError> {
        if amount <= Decimal::ZERO {
            return Err(TradeError::validation(
                "amount",
                format!("swap amount must be positive, got {amount}"),
            ));
        }

        let requests = self.providers.iter().map(|provider| async move {
            let result = provider.quote(input_token, output_token, amount).await;
            (provider.venue().to_string(), result)
        });

        // join_all preserves registration order in its output, which is
        // what makes the tie-break deterministic below.
        let mut best: Option<Quote> = None;
        for (venue, result) in join_all(requests).await {
            match result {
                Ok(quote) => {
                    debug!(
                        venue = %venue,
                        price_impact = %quote.price_impact,
                        output = %quote.output_amount,
                        "Venue quote received"
                    );
                    let better = best
                        .as_ref()
                        .is_none_or(|b| quote.price_impact < b.price_impact);
                    if better {
                        best = Some(quote);
                    }
                }
                Err(error) => {
                    warn!(venue = %venue, error = %error, "Venue quote failed");
                }
            }
        }

        best.ok_or_else(|| TradeError::NoQuote {
            pair: format!("{input_token}/{output_token}"),
        })
    }

    /// Fetch pool information from every provider concurrently.
    ///
    /// Venues that report no pool (`Ok(None)`) are skipped silently;
    /// failed venues are logged and discarded. An empty aggregate fails
    /// with `TradeError::NoLiquidityData`.
    pub async fn pool_info(&self, pair: &TokenPair) -> Result<AggregatedPools, TradeError> {
        let requests = self.providers.iter().map(|provider| async move {
            let result = provider.pool_info(pair).await;
            (provider.venue().to_string(), result)
        });

        let mut pools = Vec::new();
        for (venue, result) in join_all(requests).await {
            match result {
                Ok(Some(pool)) => pools.push(pool),
                Ok(None) => debug!(venue = %venue, pair = %pair, "No pool on venue"),
                Err(error) => {
                    warn!(venue = %venue, error = %error, "Venue pool query failed");
                }
            }
        }

        if pools.is_empty() {
            return Err(TradeError::NoLiquidityData {
                pair: pair.to_string(),
            });
        }

        Ok(AggregatedPools {
            pair: pair.clone(),
            pools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use crate::domain::market::SwapFill;

    /// Minimal in-process venue for tie-break and failure-domain tests.
    struct StubVenue {
        venue: String,
        impact: Option<Decimal>,
        liquidity: Option<Decimal>,
        healthy: bool,
    }

    #[async_trait]
    impl QuoteProvider for StubVenue {
        fn venue(&self) -> &str {
            &self.venue
        }

        async fn quote(
            &self,
            input_token: &str,
            output_token: &str,
            amount: Decimal,
        ) -> anyhow::Result<Quote> {
            let impact = self.impact.ok_or_else(|| anyhow::anyhow!("venue down"))?;
            Ok(Quote {
                venue: self.venue.clone(),
                input_token: input_token.to_string(),
                output_token: output_token.to_string(),
                input_amount: amount,
                output_amount: amount * dec!(0.99),
                price_impact: impact,
                route: String::new(),
                timestamp: Utc::now(),
            })
        }

        async fn pool_info(&self, pair: &TokenPair) -> anyhow::Result<Option<PoolSnapshot>> {
            let _ = pair;
            Ok(self.liquidity.map(|liquidity| PoolSnapshot {
                venue: self.venue.clone(),
                liquidity_usd: liquidity,
                volume_24h: dec!(100000),
                price: dec!(1),
                spread: dec!(0.001),
                base_reserves: dec!(1000000),
                quote_reserves: dec!(1000000),
            }))
        }

        async fn execute(&self, _quote: &Quote) -> anyhow::Result<SwapFill> {
            anyhow::bail!("not used in aggregator tests")
        }

        async fn is_healthy(&self) -> bool {
            self.healthy
        }
    }

    fn venue(name: &str, impact: Option<Decimal>, liquidity: Option<Decimal>) -> Arc<dyn QuoteProvider> {
        Arc::new(StubVenue {
            venue: name.to_string(),
            impact,
            liquidity,
            healthy: true,
        })
    }

    fn down_venue(name: &str) -> Arc<dyn QuoteProvider> {
        Arc::new(StubVenue {
            venue: name.to_string(),
            impact: None,
            liquidity: None,
            healthy: false,
        })
    }

    #[tokio::test]
    async fn test_best_quote_picks_minimum_impact() {
        let aggregator = VenueAggregator::new(vec![
            venue("jupiter", Some(dec!(0.03)), None),
            venue("raydium", Some(dec!(0.01)), None),
        ]);
        let quote = aggregator.best_quote("SOL", "USDC", dec!(100)).await.unwrap();
        assert_eq!(quote.venue, "raydium");
    }

    #[tokio::test]
    async fn test_best_quote_tie_goes_to_first_registered() {
        let aggregator = VenueAggregator::new(vec![
            venue("jupiter", Some(dec!(0.01)), None),
            venue("raydium", Some(dec!(0.01)), None),
        ]);
        let quote = aggregator.best_quote("SOL", "USDC", dec!(100)).await.unwrap();
        assert_eq!(quote.venue, "jupiter");
    }

    #[tokio::test]
    async fn test_best_quote_tolerates_partial_failure() {
        let aggregator = VenueAggregator::new(vec![
            venue("jupiter", None, None),
            venue("raydium", Some(dec!(0.02)), None),
        ]);
        let quote = aggregator.best_quote("SOL", "USDC", dec!(100)).await.unwrap();
        assert_eq!(quote.venue, "raydium");
    }

    #[tokio::test]
    async fn test_best_quote_all_failed_is_no_quote() {
        let aggregator = VenueAggregator::new(vec![
            venue("jupiter", None, None),
            venue("raydium", None, None),
        ]);
        let result = aggregator.best_quote("SOL", "USDC", dec!(100)).await;
        assert!(matches!(result, Err(TradeError::NoQuote { .. })));
    }

    #[tokio::test]
    async fn test_best_quote_rejects_non_positive_amount() {
        let aggregator = VenueAggregator::new(vec![venue("jupiter", Some(dec!(0.01)), None)]);
        let result = aggregator.best_quote("SOL", "USDC", dec!(0)).await;
        assert!(matches!(result, Err(TradeError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_pool_info_best_liquidity_with_tie_break() {
        let aggregator = VenueAggregator::new(vec![
            venue("jupiter", None, Some(dec!(500000))),
            venue("raydium", None, Some(dec!(500000))),
            venue("orca", None, Some(dec!(200000))),
        ]);
        let pair: TokenPair = "SOL/USDC".parse().unwrap();
        let pools = aggregator.pool_info(&pair).await.unwrap();
        assert_eq!(pools.pools.len(), 3);
        assert_eq!(pools.best_liquidity().venue, "jupiter");
    }

    #[tokio::test]
    async fn test_any_healthy_survives_a_partial_outage() {
        let aggregator = VenueAggregator::new(vec![
            down_venue("jupiter"),
            venue("raydium", Some(dec!(0.01)), None),
        ]);
        assert!(aggregator.any_healthy().await);
    }

    #[tokio::test]
    async fn test_any_healthy_false_when_every_venue_is_down() {
        let aggregator = VenueAggregator::new(vec![
            down_venue("jupiter"),
            down_venue("raydium"),
        ]);
        assert!(!aggregator.any_healthy().await);
    }

    #[tokio::test]
    async fn test_pool_info_empty_is_no_liquidity_data() {
        let aggregator = VenueAggregator::new(vec![venue("jupiter", None, None)]);
        let pair: TokenPair = "SOL/USDC".parse().unwrap();
        let result = aggregator.pool_info(&pair).await;
        assert!(matches!(result, Err(TradeError::NoLiquidityData { .. })));
    }
}
