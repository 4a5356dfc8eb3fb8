//! Prometheus Metrics Registry - Trading Observability
//!
//! Registers the counters the engines record through the metrics sink
//! port. All metrics follow the naming convention `dex_bot_*` and carry
//! venue or threshold labels for filtering.

use prometheus::{CounterVec, Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ports::telemetry::MetricsSink;

/// Centralized Prometheus metrics for the trading bot.
pub struct MetricsRegistry {
    registry: Registry,
    /// Total swaps completed per venue.
    pub swaps_executed: IntCounterVec,
    /// Total swap execution failures per venue.
    pub swaps_failed: IntCounterVec,
    /// Cumulative swap volume in USD per venue.
    pub swap_volume_usd: CounterVec,
    /// Trades rejected per liquidity gate threshold.
    pub gate_rejections: IntCounterVec,
    /// Strategy mode switches per target mode.
    pub mode_switches: IntCounterVec,
    /// Current portfolio value gauge.
    pub portfolio_value: Gauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let swaps_executed = IntCounterVec::new(
            Opts::new("dex_bot_swaps_executed_total", "Total swaps completed"),
            &["venue"],
        )?;

        let swaps_failed = IntCounterVec::new(
            Opts::new(
                "dex_bot_swaps_failed_total",
                "Total swap execution failures",
            ),
            &["venue"],
        )?;

        let swap_volume_usd = CounterVec::new(
            Opts::new(
                "dex_bot_swap_volume_usd_total",
                "Cumulative swap volume in USD",
            ),
            &["venue"],
        )?;

        let gate_rejections = IntCounterVec::new(
            Opts::new(
                "dex_bot_gate_rejections_total",
                "Trades rejected by liquidity gate thresholds",
            ),
            &["threshold"],
        )?;

        let mode_switches = IntCounterVec::new(
            Opts::new("dex_bot_mode_switches_total", "Strategy mode switches"),
            &["to_mode"],
        )?;

        let portfolio_value = Gauge::new(
            "dex_bot_portfolio_value_usd",
            "Current portfolio value in USD",
        )?;

        registry.register(Box::new(swaps_executed.clone()))?;
        registry.register(Box::new(swaps_failed.clone()))?;
        registry.register(Box::new(swap_volume_usd.clone()))?;
        registry.register(Box::new(gate_rejections.clone()))?;
        registry.register(Box::new(mode_switches.clone()))?;
        registry.register(Box::new(portfolio_value.clone()))?;

        Ok(Self {
            registry,
            swaps_executed,
            swaps_failed,
            swap_volume_usd,
            gate_rejections,
            mode_switches,
            portfolio_value,
        })
    }

    /// Update the portfolio value gauge.
    pub fn set_portfolio_value(&self, value: Decimal) {
        self.portfolio_value.set(value.to_f64().unwrap_or(0.0));
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn gather_text(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl MetricsSink for MetricsRegistry {
    fn record_swap(&self, venue: &str, volume_usd: Decimal) {
        self.swaps_executed.with_label_values(&[venue]).inc();
        self.swap_volume_usd
            .with_label_values(&[venue])
            .inc_by(volume_usd.to_f64().unwrap_or(0.0));
    }

    fn record_swap_failure(&self, venue: &str) {
        self.swaps_failed.with_label_values(&[venue]).inc();
    }

    fn record_gate_rejection(&self, threshold: &str) {
        self.gate_rejections.with_label_values(&[threshold]).inc();
    }

    fn record_mode_switch(&self, to_mode: &str) {
        self.mode_switches.with_label_values(&[to_mode]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_recorded_metrics_show_up_in_exposition() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.record_swap("jupiter", dec!(12500));
        metrics.record_gate_rejection("liquidity");
        metrics.record_mode_switch("opportunistic");
        metrics.set_portfolio_value(dec!(1000000));

        let text = metrics.gather_text();
        assert!(text.contains("dex_bot_swaps_executed_total"));
        assert!(text.contains("venue=\"jupiter\""));
        assert!(text.contains("dex_bot_gate_rejections_total"));
        assert!(text.contains("threshold=\"liquidity\""));
        assert!(text.contains("dex_bot_portfolio_value_usd 1000000"));
    }
}
