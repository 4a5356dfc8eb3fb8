//! Configuration Module - TOML-based Agent Configuration
//!
//! Loads and validates configuration from `config.toml`. Every threshold
//! that gates or sizes a trade lives here as an explicit, immutable value
//! passed into each component's constructor — nothing is hardcoded in the
//! domain layer and there are no module-level singletons.

pub mod loader;

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::domain::gate::GateLimits;
use crate::domain::market::TradingMode;
use crate::domain::sizing::SizingParams;

/// Top-level agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Agent identity and metadata.
    pub bot: BotConfig,
    /// Venue registry. Order defines tie-break priority.
    pub venues: Vec<VenueConfig>,
    /// Liquidity gate thresholds.
    #[serde(default)]
    pub gate: GateConfig,
    /// Risk engine limits.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Position sizing parameters.
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Strategy mode controller parameters.
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Metrics and monitoring.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Agent identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Human-readable agent name.
    pub name: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Dry-run mode: quotes flow through simulated venues, no real swaps.
    #[serde(default)]
    pub dry_run: bool,
}

/// One venue registry entry.
///
/// Position in the `[[venues]]` list IS the registration order: the
/// aggregator breaks best-quote and best-liquidity ties in favor of
/// earlier entries.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    /// Stable venue identifier (e.g. "jupiter").
    pub name: String,
    /// Whether this venue participates in aggregation.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Simulated pools served by this venue in dry-run mode.
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

/// A simulated constant-product pool definition (dry-run mode).
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// "BASE/QUOTE" pair this pool serves.
    pub pair: String,
    /// Pool price (quote per base).
    pub price: Decimal,
    /// Base token reserves.
    pub base_reserves: Decimal,
    /// Quote token reserves.
    pub quote_reserves: Decimal,
    /// Reported 24h volume in USD.
    #[serde(default = "default_pool_volume")]
    pub volume_24h: Decimal,
    /// Reported spread fraction.
    #[serde(default = "default_pool_spread")]
    pub spread: Decimal,
}

/// Liquidity gate thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Minimum pool liquidity in USD.
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity_usd: Decimal,
    /// Minimum 24h volume in USD.
    #[serde(default = "default_min_volume")]
    pub min_volume_24h: Decimal,
    /// Maximum spread fraction.
    #[serde(default = "default_max_spread")]
    pub max_spread: Decimal,
    /// Maximum price impact fraction.
    #[serde(default = "default_max_impact")]
    pub max_price_impact: Decimal,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_liquidity_usd: default_min_liquidity(),
            min_volume_24h: default_min_volume(),
            max_spread: default_max_spread(),
            max_price_impact: default_max_impact(),
        }
    }
}

impl From<&GateConfig> for GateLimits {
    fn from(config: &GateConfig) -> Self {
        Self {
            min_liquidity_usd: config.min_liquidity_usd,
            min_volume_24h: config.min_volume_24h,
            max_spread: config.max_spread,
            max_price_impact: config.max_price_impact,
        }
    }
}

/// Risk engine limits.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Minimum margin ratio before warnings/liquidation modeling.
    #[serde(default = "default_min_margin_ratio")]
    pub min_margin_ratio: Decimal,
    /// Maximum permitted leverage.
    #[serde(default = "default_max_leverage")]
    pub max_leverage: Decimal,
    /// Global notional cap per position.
    #[serde(default = "default_max_position_size")]
    pub max_position_size: Decimal,
    /// Portfolio value at inception — the drawdown baseline.
    #[serde(default = "default_initial_value")]
    pub initial_portfolio_value: Decimal,
    /// Optional per-symbol notional caps, stricter than the global cap.
    #[serde(default)]
    pub symbol_limits: HashMap<String, Decimal>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_margin_ratio: default_min_margin_ratio(),
            max_leverage: default_max_leverage(),
            max_position_size: default_max_position_size(),
            initial_portfolio_value: default_initial_value(),
            symbol_limits: HashMap::new(),
        }
    }
}

/// Position sizing parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    /// Base position size in quote currency.
    #[serde(default = "default_base_size")]
    pub base_size: Decimal,
    /// Multiplier applied to the base size.
    #[serde(default = "default_one")]
    pub size_multiplier: Decimal,
    /// Cap as a fraction of the global max position size.
    #[serde(default = "default_max_position_percent")]
    pub max_position_percent: Decimal,
    /// Scale size by the caller's risk factor.
    #[serde(default = "default_true")]
    pub risk_based_sizing: bool,
    /// Reduce size by 20% in volatile conditions.
    #[serde(default = "default_true")]
    pub volatility_adjustment: bool,
    /// Split positions into staged entries.
    #[serde(default)]
    pub staged_entry: bool,
    /// Fraction of total size per entry stage.
    #[serde(default = "default_entry_stages")]
    pub entry_stages: Vec<Decimal>,
    /// Price multiplier targets for taking profit.
    #[serde(default = "default_profit_targets")]
    pub profit_targets: Vec<Decimal>,
    /// Fraction of the position to unwind at each target.
    #[serde(default = "default_size_per_stage")]
    pub size_per_stage: Vec<Decimal>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            base_size: default_base_size(),
            size_multiplier: default_one(),
            max_position_percent: default_max_position_percent(),
            risk_based_sizing: true,
            volatility_adjustment: true,
            staged_entry: false,
            entry_stages: default_entry_stages(),
            profit_targets: default_profit_targets(),
            size_per_stage: default_size_per_stage(),
        }
    }
}

impl From<&SizingConfig> for SizingParams {
    fn from(config: &SizingConfig) -> Self {
        Self {
            base_size: config.base_size,
            size_multiplier: config.size_multiplier,
            max_position_percent: config.max_position_percent,
            risk_based_sizing: config.risk_based_sizing,
            volatility_adjustment: config.volatility_adjustment,
            staged_entry: config.staged_entry,
            entry_stages: config.entry_stages.clone(),
            profit_targets: config.profit_targets.clone(),
            size_per_stage: config.size_per_stage.clone(),
        }
    }
}

/// Strategy mode controller parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Mode the controller starts in.
    #[serde(default = "default_initial_mode")]
    pub initial_mode: TradingMode,
    /// Pairs scanned to score market conditions, e.g. ["SOL/USDC"].
    #[serde(default)]
    pub watch_pairs: Vec<String>,
    /// Minimum seconds between mode switches (dwell time).
    #[serde(default = "default_min_dwell")]
    pub min_dwell_secs: u64,
    /// Controller poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Backoff after an iteration error, in seconds.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
    /// Advisory confidence required to switch.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            initial_mode: default_initial_mode(),
            watch_pairs: Vec::new(),
            min_dwell_secs: default_min_dwell(),
            poll_interval_secs: default_poll_interval(),
            error_backoff_secs: default_error_backoff(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus/health HTTP server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Metrics server bind address.
    #[serde(default = "default_metrics_addr")]
    pub bind_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_metrics_addr(),
        }
    }
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_one() -> Decimal {
    Decimal::ONE
}

fn default_min_liquidity() -> Decimal {
    dec!(100000)
}

fn default_min_volume() -> Decimal {
    dec!(50000)
}

fn default_max_spread() -> Decimal {
    dec!(0.01)
}

fn default_max_impact() -> Decimal {
    dec!(0.02)
}

fn default_min_margin_ratio() -> Decimal {
    dec!(0.1)
}

fn default_max_leverage() -> Decimal {
    dec!(5)
}

fn default_max_position_size() -> Decimal {
    dec!(100000)
}

fn default_initial_value() -> Decimal {
    dec!(1000000)
}

fn default_base_size() -> Decimal {
    dec!(1000)
}

fn default_max_position_percent() -> Decimal {
    dec!(0.2)
}

fn default_entry_stages() -> Vec<Decimal> {
    vec![dec!(0.5), dec!(0.3), dec!(0.2)]
}

fn default_profit_targets() -> Vec<Decimal> {
    vec![dec!(2.0), dec!(3.0), dec!(5.0)]
}

fn default_size_per_stage() -> Vec<Decimal> {
    vec![dec!(0.2), dec!(0.25), dec!(0.2)]
}

fn default_initial_mode() -> TradingMode {
    TradingMode::DexSwap
}

fn default_min_dwell() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    60
}

fn default_error_backoff() -> u64 {
    5
}

fn default_confidence_threshold() -> Decimal {
    dec!(0.8)
}

fn default_pool_volume() -> Decimal {
    dec!(500000)
}

fn default_pool_spread() -> Decimal {
    dec!(0.001)
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
