//! Quote Provider Port - Per-Venue Query/Execute Interface
//!
//! One implementation per DEX venue (Jupiter, Raydium, Orca, ...), each
//! adapting its wire protocol to this uniform contract. Implementations
//! are fully independent: no shared mutable state, and a failure in one
//! must never affect another. Retry/backoff and per-call timeouts belong
//! to each provider's transport, not to this interface — a timeout is
//! just another per-venue failure to the aggregator.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::market::{PoolSnapshot, Quote, SwapFill};
use crate::domain::pair::TokenPair;

/// Trait for per-venue quote providers.
///
/// All amounts are exchanged as `Decimal` — never binary floating point —
/// to avoid rounding drift in financial computation.
#[async_trait]
pub trait QuoteProvider: Send + Sync + 'static {
    /// Stable venue identifier (e.g. "jupiter"). Used for registry
    /// identity, logging, and metrics labels.
    fn venue(&self) -> &str;

    /// Quote a swap of `amount` input tokens for output tokens.
    ///
    /// # Errors
    /// Returns an error when the venue cannot quote the pair. The error
    /// is opaque to callers; the aggregator logs and discards it.
    async fn quote(
        &self,
        input_token: &str,
        output_token: &str,
        amount: Decimal,
    ) -> anyhow::Result<Quote>;

    /// Fetch pool information for a pair, `None` when the venue has no
    /// pool for it (a valid answer, distinct from a query failure).
    async fn pool_info(&self, pair: &TokenPair) -> anyhow::Result<Option<PoolSnapshot>>;

    /// Submit a previously obtained quote for execution.
    ///
    /// # Errors
    /// Returns an error when the venue rejects the submission. The
    /// coordinator surfaces this as a terminal `ExecutionFailure` —
    /// no automatic retry.
    async fn execute(&self, quote: &Quote) -> anyhow::Result<SwapFill>;

    /// Check if the provider's connection is healthy.
    async fn is_healthy(&self) -> bool;
}
