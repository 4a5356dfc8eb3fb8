//! Paper Venue - Simulated Constant-Product DEX
//!
//! In-process venue backed by the pools declared in config. Quoting and
//! execution run the same constant-product math as the impact model, so
//! dry runs exercise the full pipeline with realistic numbers and no
//! network at all.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::VenueConfig;
use crate::domain::impact::price_impact;
use crate::domain::market::{PoolSnapshot, Quote, SwapFill};
use crate::domain::pair::TokenPair;
use crate::ports::quote_provider::QuoteProvider;

/// A simulated pool, static for the life of the process.
#[derive(Debug, Clone)]
struct PaperPool {
    price: Decimal,
    base_reserves: Decimal,
    quote_reserves: Decimal,
    volume_24h: Decimal,
    spread: Decimal,
}

impl PaperPool {
    fn snapshot(&self, venue: &str) -> PoolSnapshot {
        PoolSnapshot {
            venue: venue.to_string(),
            liquidity_usd: self.base_reserves * self.price + self.quote_reserves,
            volume_24h: self.volume_24h,
            price: self.price,
            spread: self.spread,
            base_reserves: self.base_reserves,
            quote_reserves: self.quote_reserves,
        }
    }
}

/// Simulated venue over a fixed set of pools, keyed by pair symbol.
pub struct PaperVenue {
    venue: String,
    pools: HashMap<String, PaperPool>,
}

impl PaperVenue {
    /// Build a paper venue from its config section. Malformed pool pairs
    /// have already been rejected by config validation.
    pub fn from_config(config: &VenueConfig) -> Self {
        let pools = config
            .pools
            .iter()
            .map(|pool| {
                (
                    pool.pair.clone(),
                    PaperPool {
                        price: pool.price,
                        base_reserves: pool.base_reserves,
                        quote_reserves: pool.quote_reserves,
                        volume_24h: pool.volume_24h,
                        spread: pool.spread,
                    },
                )
            })
            .collect();
        Self {
            venue: config.name.clone(),
            pools,
        }
    }

    fn pool(&self, input_token: &str, output_token: &str) -> anyhow::Result<&PaperPool> {
        let symbol = format!("{input_token}/{output_token}");
        self.pools
            .get(&symbol)
            .ok_or_else(|| anyhow::anyhow!("no pool for {symbol} on {}", self.venue))
    }
}

#[async_trait]
impl QuoteProvider for PaperVenue {
    fn venue(&self) -> &str {
        &self.venue
    }

    async fn quote(
        &self,
        input_token: &str,
        output_token: &str,
        amount: Decimal,
    ) -> anyhow::Result<Quote> {
        let pool = self.pool(input_token, output_token)?;

        // Constant product: output is what the pool releases when the
        // input side grows by `amount` base units.
        let k = pool.base_reserves * pool.quote_reserves;
        let new_base = pool.base_reserves + amount;
        anyhow::ensure!(new_base > Decimal::ZERO, "degenerate pool reserves");
        let output_amount = pool.quote_reserves - k / new_base;

        let trade_usd = amount * pool.price;
        let impact = price_impact(pool.price, pool.base_reserves, pool.quote_reserves, trade_usd)
            .ok_or_else(|| anyhow::anyhow!("pool reserves unusable for impact model"))?;

        Ok(Quote {
            venue: self.venue.clone(),
            input_token: input_token.to_string(),
            output_token: output_token.to_string(),
            input_amount: amount,
            output_amount,
            price_impact: impact,
            route: format!("paper:{input_token}/{output_token}"),
            timestamp: chrono::Utc::now(),
        })
    }

    async fn pool_info(&self, pair: &TokenPair) -> anyhow::Result<Option<PoolSnapshot>> {
        Ok(self
            .pools
            .get(&pair.to_string())
            .map(|pool| pool.snapshot(&self.venue)))
    }

    async fn execute(&self, quote: &Quote) -> anyhow::Result<SwapFill> {
        // Paper fills are exact: no slippage beyond the quoted impact.
        Ok(SwapFill {
            output_amount: quote.output_amount,
            price_impact: quote.price_impact,
            tx_hash: format!("paper-{}", Uuid::new_v4()),
        })
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
