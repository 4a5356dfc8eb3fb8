//! Positions and the portfolio that owns them.
//!
//! The portfolio has a single logical owner (the trading account) and a
//! single writer: the execution coordinator applies fills, an external
//! mark-to-market updater refreshes prices. Risk assessments are always
//! recomputed from a snapshot of this state, never cached.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open position. Removed from the portfolio when fully closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Trading pair symbol, e.g. "SOL/USDC".
    pub symbol: String,
    /// Signed size: positive = long, negative = short.
    pub size: Decimal,
    /// Average entry price.
    pub entry_price: Decimal,
    /// Current mark price.
    pub current_price: Decimal,
    /// Leverage applied to this position.
    pub leverage: Decimal,
    /// When the position was opened.
    pub opened_at: DateTime<Utc>,
    /// Unrealized P&L at the current mark.
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// Notional value at the current mark price.
    pub fn notional(&self) -> Decimal {
        self.size * self.current_price
    }

    /// Refresh the mark price and recompute unrealized P&L.
    pub fn mark(&mut self, price: Decimal) {
        self.current_price = price;
        self.unrealized_pnl = (price - self.entry_price) * self.size;
    }
}

/// The trading account's portfolio: symbol → position, unique keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    /// Open positions keyed by symbol.
    pub positions: HashMap<String, Position>,
    /// Total account value in quote currency.
    pub total_value: Decimal,
    /// Collateral not locked by open positions.
    pub free_collateral: Decimal,
    /// Value at inception, the drawdown baseline.
    pub initial_value: Decimal,
}

impl Portfolio {
    /// Create a portfolio with the given starting value, fully liquid.
    pub fn with_initial_value(value: Decimal) -> Self {
        Self {
            positions: HashMap::new(),
            total_value: value,
            free_collateral: value,
            initial_value: value,
        }
    }

    /// Apply a fill: open a new position or average into an existing one.
    ///
    /// Margin is accounted here: a fill that adds exposure locks
    /// `|size| * price / leverage` out of `free_collateral`, and a fill
    /// that reduces exposure releases the margin locked for the closed
    /// portion at its entry terms. A fill that brings the size to exactly
    /// zero removes the position.
    pub fn apply_fill(&mut self, symbol: &str, size: Decimal, price: Decimal, leverage: Decimal) {
        match self.positions.get_mut(symbol) {
            Some(position) => {
                let new_size = position.size + size;
                if position.size.signum() == size.signum() {
                    self.free_collateral -= size.abs() * price / leverage;
                    // Weighted-average entry only when adding in the same direction.
                    position.entry_price = (position.entry_price * position.size
                        + price * size)
                        / new_size;
                } else {
                    let closed = size.abs().min(position.size.abs());
                    self.free_collateral +=
                        closed * position.entry_price / position.leverage;
                }
                if new_size == Decimal::ZERO {
                    self.positions.remove(symbol);
                    return;
                }
                position.size = new_size;
                position.mark(price);
            }
            None => {
                self.free_collateral -= size.abs() * price / leverage;
                let mut position = Position {
                    symbol: symbol.to_string(),
                    size,
                    entry_price: price,
                    current_price: price,
                    leverage,
                    opened_at: Utc::now(),
                    unrealized_pnl: Decimal::ZERO,
                };
                position.mark(price);
                self.positions.insert(symbol.to_string(), position);
            }
        }
    }

    /// Sum of absolute notional across all positions.
    pub fn total_notional(&self) -> Decimal {
        self.positions.values().map(|p| p.notional().abs()).sum()
    }
}
