//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters, and
//! providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::warn;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;

    validate_config(&config)?;

    Ok(config)
}

/// Validate all configuration parameters.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Venue registry validation
    anyhow::ensure!(
        !config.venues.is_empty(),
        "At least one venue must be configured"
    );
    for (i, venue) in config.venues.iter().enumerate() {
        anyhow::ensure!(!venue.name.is_empty(), "Venue {} has empty name", i);
        anyhow::ensure!(
            config.venues.iter().filter(|v| v.name == venue.name).count() == 1,
            "Duplicate venue name: {}",
            venue.name
        );
        for pool in &venue.pools {
            anyhow::ensure!(
                pool.pair.split('/').filter(|s| !s.is_empty()).count() == 2,
                "Venue {} has malformed pool pair: {:?}",
                venue.name,
                pool.pair
            );
        }
    }
    anyhow::ensure!(
        config.venues.iter().any(|v| v.enabled),
        "At least one venue must be enabled"
    );

    // Gate validation
    anyhow::ensure!(
        config.gate.min_liquidity_usd > Decimal::ZERO,
        "min_liquidity_usd must be positive, got {}",
        config.gate.min_liquidity_usd
    );
    anyhow::ensure!(
        config.gate.min_volume_24h > Decimal::ZERO,
        "min_volume_24h must be positive, got {}",
        config.gate.min_volume_24h
    );
    anyhow::ensure!(
        config.gate.max_spread > Decimal::ZERO && config.gate.max_spread < Decimal::ONE,
        "max_spread must be in (0, 1), got {}",
        config.gate.max_spread
    );
    anyhow::ensure!(
        config.gate.max_price_impact > Decimal::ZERO,
        "max_price_impact must be positive, got {}",
        config.gate.max_price_impact
    );

    // Risk validation
    anyhow::ensure!(
        config.risk.min_margin_ratio > Decimal::ZERO
            && config.risk.min_margin_ratio < Decimal::ONE,
        "min_margin_ratio must be in (0, 1), got {}",
        config.risk.min_margin_ratio
    );
    anyhow::ensure!(
        config.risk.max_leverage >= Decimal::ONE,
        "max_leverage must be at least 1, got {}",
        config.risk.max_leverage
    );
    anyhow::ensure!(
        config.risk.max_position_size > Decimal::ZERO,
        "max_position_size must be positive"
    );
    anyhow::ensure!(
        config.risk.initial_portfolio_value > Decimal::ZERO,
        "initial_portfolio_value must be positive"
    );

    // Sizing validation
    anyhow::ensure!(
        config.sizing.base_size > Decimal::ZERO,
        "sizing base_size must be positive"
    );
    anyhow::ensure!(
        config.sizing.max_position_percent > Decimal::ZERO
            && config.sizing.max_position_percent <= Decimal::ONE,
        "max_position_percent must be in (0, 1], got {}",
        config.sizing.max_position_percent
    );
    if config.sizing.staged_entry {
        let stages = config.sizing.entry_stages.len();
        let targets = config.sizing.profit_targets.len();
        let weights = config.sizing.size_per_stage.len();
        anyhow::ensure!(
            stages > 0 && targets > 0 && weights > 0,
            "staged_entry requires non-empty stage lists"
        );
        // Mismatched lengths truncate to the shortest list at sizing time;
        // surface that once here instead of silently dropping stages.
        if stages != targets || targets != weights {
            warn!(
                entry_stages = stages,
                profit_targets = targets,
                size_per_stage = weights,
                "Staged-entry lists have different lengths; extra entries are ignored"
            );
        }
    }

    // Strategy validation
    anyhow::ensure!(
        config.strategy.poll_interval_secs > 0,
        "strategy poll_interval_secs must be positive"
    );
    anyhow::ensure!(
        config.strategy.confidence_threshold >= Decimal::ZERO
            && config.strategy.confidence_threshold <= Decimal::ONE,
        "confidence_threshold must be in [0, 1], got {}",
        config.strategy.confidence_threshold
    );
    for pair in &config.strategy.watch_pairs {
        anyhow::ensure!(
            pair.split('/').filter(|s| !s.is_empty()).count() == 2,
            "Malformed strategy watch pair: {:?}",
            pair
        );
    }

    Ok(())
}
