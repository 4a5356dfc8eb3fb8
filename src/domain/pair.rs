//! Token pair parsing.
//!
//! Pairs travel as `"BASE/QUOTE"` strings at the API boundary and are
//! validated into a `TokenPair` before any I/O happens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TradeError;

/// A validated trading pair: base token and quote token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    /// Base token identifier (the asset being bought/sold).
    pub base: String,
    /// Quote token identifier (the asset it is priced in).
    pub quote: String,
}

impl TokenPair {
    /// Build a pair from already-validated parts.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl FromStr for TokenPair {
    type Err = TradeError;

    /// Parse `"BASE/QUOTE"`. Exactly two non-empty segments are required.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) if !base.is_empty() && !quote.is_empty() => {
                Ok(Self::new(base, quote))
            }
            _ => Err(TradeError::validation(
                "pair",
                format!("invalid pair format: {s:?}, expected \"BASE/QUOTE\""),
            )),
        }
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
