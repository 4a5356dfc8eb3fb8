//! Core market data types.
//!
//! Quotes and pool snapshots are ephemeral: produced per request, consumed
//! immediately, never persisted. All currency-scale and ratio values are
//! `Decimal` — binary floating point never touches financial computation,
//! including at the provider boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A swap quote returned by a single venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Venue that produced this quote.
    pub venue: String,
    /// Input token identifier.
    pub input_token: String,
    /// Output token identifier.
    pub output_token: String,
    /// Amount of input token offered.
    pub input_amount: Decimal,
    /// Amount of output token the venue would return.
    pub output_amount: Decimal,
    /// Estimated price impact as a fraction. Ideally in [0, 1] but may
    /// exceed 1 for degenerate pools; callers gate, never assume.
    pub price_impact: Decimal,
    /// Opaque venue-specific routing payload, passed back on execute.
    pub route: String,
    /// When the quote was produced.
    pub timestamp: DateTime<Utc>,
}

/// A liquidity pool snapshot from a single venue.
///
/// Queried fresh per request; short-lived caching is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Venue this pool lives on.
    pub venue: String,
    /// Total pool liquidity in USD.
    pub liquidity_usd: Decimal,
    /// 24-hour trading volume in USD.
    pub volume_24h: Decimal,
    /// Current pool price (quote per base).
    pub price: Decimal,
    /// Bid/ask spread as a fraction of mid.
    pub spread: Decimal,
    /// Base token reserves (for the constant-product impact model).
    pub base_reserves: Decimal,
    /// Quote token reserves.
    pub quote_reserves: Decimal,
}

/// Result of submitting a swap to a venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapFill {
    /// Output amount actually received.
    pub output_amount: Decimal,
    /// Realized price impact.
    pub price_impact: Decimal,
    /// On-chain transaction hash.
    pub tx_hash: String,
}

/// Terminal status of a swap attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    /// Swap submitted and confirmed by the venue.
    Completed,
}

/// The coordinator's answer for one swap attempt.
///
/// A failed attempt is a `TradeError`, not a receipt — there is no
/// partial or "failed receipt" state, and no automatic retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapReceipt {
    /// Terminal swap status.
    pub status: SwapStatus,
    /// Input amount spent.
    pub input_amount: Decimal,
    /// Output amount received.
    pub output_amount: Decimal,
    /// Realized price impact.
    pub price_impact: Decimal,
    /// On-chain transaction hash.
    pub tx_hash: String,
    /// Venue the swap executed on.
    pub venue: String,
}

/// Trading modes the strategy controller switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    /// Routine multi-venue swap execution.
    DexSwap,
    /// Aggressive scanning of short-lived opportunities.
    Opportunistic,
}

impl TradingMode {
    /// Parse a mode name as delivered by the advisory boundary.
    ///
    /// Unknown names are `None` — the controller treats that as an
    /// unusable recommendation, never as a default mode.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dex_swap" => Some(Self::DexSwap),
            "opportunistic" => Some(Self::Opportunistic),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DexSwap => write!(f, "dex_swap"),
            Self::Opportunistic => write!(f, "opportunistic"),
        }
    }
}
