//! Strategy Mode Controller - Hysteretic Mode Switching Loop
//!
//! Background control loop that periodically scores market conditions,
//! consults the opaque advisory signal, and switches the active trading
//! mode. Hysteresis: a switch is only considered once `min_dwell` has
//! elapsed since the last one, and only when advisory confidence clears
//! the configured threshold — the controller must not thrash.
//!
//! The loop never terminates on a transient error: it logs, backs off
//! briefly, and continues. It stops only on the shutdown signal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::StrategyConfig;
use crate::domain::error::TradeError;
use crate::domain::market::TradingMode;
use crate::domain::pair::TokenPair;
use crate::domain::{GateLimits, LiquidityGate};
use crate::ports::advisory::{Advisory, AdvisorySource, MarketConditions};
use crate::ports::telemetry::{AlertLevel, AuditRecord, AuditSink, MetricsSink};

use super::aggregator::VenueAggregator;

/// Rolling per-mode performance metrics.
///
/// Win rate and average return are exponentially weighted with a 0.9
/// decay per settlement, so roughly the last ten trades dominate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyMetrics {
    /// Accumulated total P&L.
    pub total_pnl: Decimal,
    /// Exponentially weighted win rate.
    pub win_rate: Decimal,
    /// Exponentially weighted average return.
    pub avg_return: Decimal,
    /// Latest volatility estimate.
    pub volatility: Decimal,
    /// Latest Sharpe ratio estimate.
    pub sharpe_ratio: Decimal,
    /// Worst drawdown seen.
    pub max_drawdown: Decimal,
}

impl StrategyMetrics {
    /// Fold one settled trade into the rolling metrics.
    pub fn record(&mut self, outcome: &TradeOutcome) {
        let nine = Decimal::from(9);
        let ten = Decimal::from(10);

        self.total_pnl += outcome.pnl;
        if outcome.pnl > Decimal::ZERO {
            self.win_rate = (self.win_rate * nine + Decimal::ONE) / ten;
        } else {
            self.win_rate = self.win_rate * nine / ten;
        }
        self.avg_return = (self.avg_return * nine + outcome.pnl) / ten;

        if let Some(volatility) = outcome.volatility {
            self.volatility = volatility;
        }
        if let Some(sharpe) = outcome.sharpe_ratio {
            self.sharpe_ratio = sharpe;
        }
        if let Some(drawdown) = outcome.drawdown {
            self.max_drawdown = self.max_drawdown.max(drawdown);
        }
    }
}

/// A settled trade attributed to a mode, fed back by the coordinator.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    /// Realized P&L of the trade.
    pub pnl: Decimal,
    /// Optional volatility estimate at settlement.
    pub volatility: Option<Decimal>,
    /// Optional Sharpe ratio estimate at settlement.
    pub sharpe_ratio: Option<Decimal>,
    /// Optional drawdown observed during the trade.
    pub drawdown: Option<Decimal>,
}

/// A settlement message routed into the controller loop.
#[derive(Debug, Clone)]
pub struct ModeSettlement {
    /// Mode that was active when the trade executed.
    pub mode: TradingMode,
    /// The settled trade.
    pub outcome: TradeOutcome,
}

/// Current mode plus the time of the last switch.
#[derive(Debug, Clone)]
pub struct ModeState {
    /// Active trading mode.
    pub mode: TradingMode,
    /// When the mode was last switched (or the controller started).
    pub last_switch: Instant,
}

impl ModeState {
    /// Whether the dwell-time invariant permits a switch now.
    pub fn dwell_elapsed(&self, min_dwell: Duration) -> bool {
        self.last_switch.elapsed() >= min_dwell
    }
}

/// Background controller owning the mode state (single writer).
pub struct StrategyModeController {
    aggregator: Arc<VenueAggregator>,
    advisory: Arc<dyn AdvisorySource>,
    audit: Arc<dyn AuditSink>,
    metrics_sink: Arc<dyn MetricsSink>,
    config: StrategyConfig,
    /// Pairs scanned to score market conditions.
    watch_pairs: Vec<TokenPair>,
    /// Gate used as the pass/fail scorer for watched pairs.
    gate: LiquidityGate,
    state: ModeState,
    metrics: HashMap<TradingMode, StrategyMetrics>,
    mode_tx: watch::Sender<TradingMode>,
    settlement_rx: mpsc::Receiver<ModeSettlement>,
    shutdown_rx: broadcast::Receiver<()>,
}

/// Handles the rest of the system uses to talk to the controller.
pub struct ModeHandles {
    /// Read side of the published mode.
    pub mode_rx: watch::Receiver<TradingMode>,
    /// Settlement feedback channel for the execution coordinator.
    pub settlement_tx: mpsc::Sender<ModeSettlement>,
}

impl StrategyModeController {
    /// Create a controller and the handles for its collaborators.
    pub fn new(
        aggregator: Arc<VenueAggregator>,
        advisory: Arc<dyn AdvisorySource>,
        audit: Arc<dyn AuditSink>,
        metrics_sink: Arc<dyn MetricsSink>,
        config: StrategyConfig,
        gate_limits: GateLimits,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> (Self, ModeHandles) {
        let watch_pairs = config
            .watch_pairs
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect();
        let (mode_tx, mode_rx) = watch::channel(config.initial_mode);
        let (settlement_tx, settlement_rx) = mpsc::channel(64);

        let controller = Self {
            aggregator,
            advisory,
            audit,
            metrics_sink,
            state: ModeState {
                mode: config.initial_mode,
                last_switch: Instant::now(),
            },
            config,
            watch_pairs,
            gate: LiquidityGate::new(gate_limits),
            metrics: HashMap::new(),
            mode_tx,
            settlement_rx,
            shutdown_rx,
        };
        (controller, ModeHandles { mode_rx, settlement_tx })
    }

    /// Currently active mode.
    pub fn current_mode(&self) -> TradingMode {
        self.state.mode
    }

    /// Rolling metrics for a mode.
    pub fn metrics(&self, mode: TradingMode) -> Option<&StrategyMetrics> {
        self.metrics.get(&mode)
    }

    /// Run the control loop until shutdown.
    ///
    /// Each tick is independent: an error in one iteration is logged and
    /// followed by a short backoff, never a loop exit.
    pub async fn run(mut self) {
        info!(
            mode = %self.state.mode,
            poll_secs = self.config.poll_interval_secs,
            dwell_secs = self.config.min_dwell_secs,
            "Strategy mode controller started"
        );

        let poll = Duration::from_secs(self.config.poll_interval_secs);
        let backoff = Duration::from_secs(self.config.error_backoff_secs);
        let mut settlements_open = true;

        // A single interval keeps its deadline across wakeups, so heavy
        // settlement traffic cannot starve the evaluation tick.
        let mut poll_timer = tokio::time::interval_at(tokio::time::Instant::now() + poll, poll);
        poll_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => {
                    info!("Mode controller received shutdown signal");
                    break;
                }
                settlement = self.settlement_rx.recv(), if settlements_open => {
                    match settlement {
                        Some(settlement) => self.record_settlement(settlement),
                        // All senders gone; stop polling a closed channel.
                        None => settlements_open = false,
                    }
                }
                _ = poll_timer.tick() => {
                    if let Err(error) = self.tick().await {
                        warn!(error = %error, "Mode evaluation failed, backing off");
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }

    /// Fold a settlement into the metrics of its mode.
    fn record_settlement(&mut self, settlement: ModeSettlement) {
        self.metrics
            .entry(settlement.mode)
            .or_default()
            .record(&settlement.outcome);
    }

    /// One evaluation cycle: dwell gate → conditions → advisory → switch.
    async fn tick(&mut self) -> anyhow::Result<()> {
        // Hysteresis: inside the dwell window the tick is a no-op, the
        // advisory is not even consulted.
        if !self
            .state
            .dwell_elapsed(Duration::from_secs(self.config.min_dwell_secs))
        {
            debug!("Dwell time not elapsed, skipping evaluation");
            return Ok(());
        }

        let conditions = self.market_conditions().await;

        // Advisory failure is fail-safe: log, no switch, loop continues.
        let advisory = match self.advisory.recommend(self.state.mode, &conditions).await {
            Ok(advisory) => advisory,
            Err(error) => {
                let error = TradeError::AdvisoryUnavailable {
                    reason: error.to_string(),
                };
                warn!(error = %error, "Keeping current mode");
                return Ok(());
            }
        };

        if let Some(new_mode) = self.decide(&advisory) {
            self.switch_to(new_mode).await;
        }
        Ok(())
    }

    /// Apply confidence and identity gating to an advisory.
    ///
    /// Confidence is clamped into [0, 1] before comparison — a value
    /// outside the range is never trusted blindly. Dwell has already
    /// been checked by the caller.
    fn decide(&self, advisory: &Advisory) -> Option<TradingMode> {
        let confidence = advisory.confidence.clamp(Decimal::ZERO, Decimal::ONE);

        let Some(recommended) = advisory.mode() else {
            warn!(
                recommended = %advisory.recommended_mode,
                "Advisory recommended an unknown mode, ignoring"
            );
            return None;
        };

        if confidence > self.config.confidence_threshold && recommended != self.state.mode {
            info!(
                from = %self.state.mode,
                to = %recommended,
                confidence = %confidence,
                "Mode switch recommended"
            );
            Some(recommended)
        } else {
            None
        }
    }

    /// Commit a mode switch: update state, reset the dwell timer,
    /// publish, and audit.
    async fn switch_to(&mut self, mode: TradingMode) {
        let previous = self.state.mode;
        self.state.mode = mode;
        self.state.last_switch = Instant::now();
        let _ = self.mode_tx.send(mode);
        self.metrics_sink.record_mode_switch(&mode.to_string());

        self.audit
            .record(AuditRecord::new(
                "mode_switch",
                serde_json::json!({ "from": previous.to_string(), "to": mode.to_string() }),
                AlertLevel::Info,
            ))
            .await;

        info!(from = %previous, to = %mode, "Trading mode switched");
    }

    /// Score market conditions by scanning the watched pairs.
    ///
    /// A pair counts toward the DEX score when its best pool passes the
    /// pre-quote gate checks. Scan failures degrade the score rather
    /// than failing the tick — a venue outage must not stall the loop.
    async fn market_conditions(&self) -> MarketConditions {
        if self.watch_pairs.is_empty() {
            return MarketConditions::default();
        }

        let mut passing = 0u32;
        let mut spread_sum = Decimal::ZERO;
        let mut scanned = 0u32;

        for pair in &self.watch_pairs {
            match self.aggregator.pool_info(pair).await {
                Ok(pools) => {
                    let best = pools.best_liquidity();
                    scanned += 1;
                    spread_sum += best.spread;
                    if self.gate.check_pool(best).is_ok() {
                        passing += 1;
                    }
                }
                Err(error) => {
                    debug!(pair = %pair, error = %error, "Condition scan failed for pair");
                }
            }
        }

        let total = Decimal::from(self.watch_pairs.len() as u64);
        let dex_score = Decimal::from(passing) / total;
        MarketConditions {
            dex_score,
            opportunistic_score: Decimal::ONE - dex_score,
            volatility: if scanned > 0 {
                spread_sum / Decimal::from(scanned)
            } else {
                Decimal::ZERO
            },
        }
    }
}
