//! Trade error taxonomy.
//!
//! Every user-visible failure carries machine-checkable structured fields,
//! never just a message string. Per-venue failures are NOT represented here:
//! they stay opaque (`anyhow::Error`) and are absorbed at the aggregator
//! boundary — only the aggregate "no venue answered" outcomes surface.

use rust_decimal::Decimal;
use thiserror::Error;

use super::gate::GateThreshold;

/// Structured failure taxonomy for the execution-and-risk core.
#[derive(Debug, Clone, Error)]
pub enum TradeError {
    /// Malformed input rejected before any I/O (pair, amount, leverage...).
    #[error("validation failed for {field}: {message}")]
    Validation {
        /// Which input field failed validation.
        field: &'static str,
        /// Human-readable description of the violation.
        message: String,
    },

    /// Every enabled venue failed to return a quote.
    #[error("no venue returned a quote for {pair}")]
    NoQuote {
        /// The "BASE/QUOTE" pair that was requested.
        pair: String,
    },

    /// Every enabled venue failed to return pool information.
    #[error("no venue returned liquidity data for {pair}")]
    NoLiquidityData {
        /// The "BASE/QUOTE" pair that was requested.
        pair: String,
    },

    /// A liquidity gate threshold failed.
    #[error("{threshold} gate rejected: observed {observed}, limit {limit}")]
    GateRejected {
        /// Which threshold failed.
        threshold: GateThreshold,
        /// The configured limit.
        limit: Decimal,
        /// The observed value that violated it.
        observed: Decimal,
    },

    /// A venue accepted the quote but swap submission failed.
    /// Never retried automatically within this core.
    #[error("swap submission failed on {venue}: {reason}")]
    ExecutionFailure {
        /// Venue that rejected the submission.
        venue: String,
        /// Venue-reported failure reason.
        reason: String,
    },

    /// The advisory signal was missing or malformed. Fail-safe: callers
    /// must treat this as "do not switch", never as a reason to stop.
    #[error("advisory signal unavailable: {reason}")]
    AdvisoryUnavailable {
        /// Why the signal could not be obtained.
        reason: String,
    },

    /// A trade was rejected by risk validation.
    #[error("trade rejected by risk engine: {reason}")]
    RiskRejected {
        /// Which limit the trade violated.
        reason: String,
    },
}

impl TradeError {
    /// Shorthand for a validation failure.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
