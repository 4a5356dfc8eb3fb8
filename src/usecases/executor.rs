//! Execution Coordinator - Gated Swap Pipeline
//!
//! Drives one swap attempt end to end: aggregate pool data, run the
//! liquidity gates, fetch the best quote, size the trade against current
//! portfolio risk, validate it, and submit to the winning venue. A failed
//! attempt is an error, never a "failed receipt", and there is no
//! automatic retry: the caller decides whether to try again.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{info, warn};

use crate::domain::error::TradeError;
use crate::domain::market::{SwapReceipt, SwapStatus, TradingMode};
use crate::domain::pair::TokenPair;
use crate::domain::portfolio::Portfolio;
use crate::domain::sizing::PositionSizer;
use crate::domain::{GateLimits, LiquidityGate};
use crate::ports::telemetry::{
    AlertEvent, AlertLevel, AlertSink, AuditRecord, AuditSink, MetricsSink,
};
use crate::usecases::risk_engine::{RiskEngine, TradeIntent};

use super::aggregator::VenueAggregator;
use super::mode_controller::{ModeSettlement, TradeOutcome};

/// Floor applied to the portfolio-derived risk factor so a stressed
/// portfolio still trades, just small.
const MIN_RISK_FACTOR: Decimal = dec!(0.1);

/// A swap the caller wants executed.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    /// Pair to trade, base bought with quote.
    pub pair: TokenPair,
    /// Input amount in base units. `None` delegates sizing to the
    /// position sizer, scaled by current portfolio risk.
    pub amount: Option<Decimal>,
    /// Leverage for the resulting position.
    pub leverage: Decimal,
}

impl SwapRequest {
    /// Unleveraged, auto-sized swap of a pair.
    pub fn spot(pair: TokenPair) -> Self {
        Self {
            pair,
            amount: None,
            leverage: Decimal::ONE,
        }
    }

    /// Unleveraged swap of an explicit base amount.
    pub fn sized(pair: TokenPair, amount: Decimal) -> Self {
        Self {
            pair,
            amount: Some(amount),
            leverage: Decimal::ONE,
        }
    }
}

/// Coordinates the gated swap pipeline. Single writer of the portfolio.
pub struct ExecutionCoordinator {
    aggregator: Arc<VenueAggregator>,
    gate: LiquidityGate,
    risk: RiskEngine,
    sizer: PositionSizer,
    portfolio: Mutex<Portfolio>,
    mode_rx: watch::Receiver<TradingMode>,
    settlement_tx: mpsc::Sender<ModeSettlement>,
    alerts: Arc<dyn AlertSink>,
    audit: Arc<dyn AuditSink>,
    metrics_sink: Arc<dyn MetricsSink>,
}

impl ExecutionCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        aggregator: Arc<VenueAggregator>,
        gate_limits: GateLimits,
        risk: RiskEngine,
        sizer: PositionSizer,
        portfolio: Portfolio,
        mode_rx: watch::Receiver<TradingMode>,
        settlement_tx: mpsc::Sender<ModeSettlement>,
        alerts: Arc<dyn AlertSink>,
        audit: Arc<dyn AuditSink>,
        metrics_sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            aggregator,
            gate: LiquidityGate::new(gate_limits),
            risk,
            sizer,
            portfolio: Mutex::new(portfolio),
            mode_rx,
            settlement_tx,
            alerts,
            audit,
            metrics_sink,
        }
    }

    /// Snapshot of the current portfolio.
    pub async fn portfolio(&self) -> Portfolio {
        self.portfolio.lock().await.clone()
    }

    /// Execute one gated swap.
    ///
    /// Pipeline order is fixed: pool gates run before any quote is
    /// requested, the impact gate runs on the winning quote, and risk
    /// validation runs on the sized trade before submission. The first
    /// failure aborts the attempt.
    pub async fn execute_swap(&self, request: &SwapRequest) -> Result<SwapReceipt, TradeError> {
        let symbol = request.pair.to_string();

        // Checks 1-3 run against the deepest pool across venues.
        let pools = self.aggregator.pool_info(&request.pair).await?;
        let best_pool = pools.best_liquidity().clone();
        self.checked_gate(self.gate.check_pool(&best_pool), &symbol)
            .await?;

        let base_amount = match request.amount {
            Some(amount) if amount > Decimal::ZERO => amount,
            Some(amount) => {
                return Err(TradeError::validation(
                    "amount",
                    format!("swap amount must be positive, got {amount}"),
                ));
            }
            None => {
                // Size from portfolio risk: the hotter the book, the
                // smaller the trade, floored rather than zeroed.
                let risk_factor = {
                    let portfolio = self.portfolio.lock().await;
                    let assessment = self.risk.assess_portfolio(&portfolio);
                    (Decimal::ONE - assessment.total_risk_score).max(MIN_RISK_FACTOR)
                };
                let sized =
                    self.sizer
                        .size(&symbol, best_pool.price, risk_factor, request.leverage)?;
                // Sizing is in quote currency; venues quote in base units.
                sized.total_size / best_pool.price
            }
        };

        let quote = self
            .aggregator
            .best_quote(&request.pair.base, &request.pair.quote, base_amount)
            .await?;
        // Check 4: the winning quote's own impact estimate.
        self.checked_gate(self.gate.check_quote(&quote), &symbol)
            .await?;

        let intent = TradeIntent {
            symbol: symbol.clone(),
            size: base_amount,
            price: best_pool.price,
        };
        {
            let portfolio = self.portfolio.lock().await;
            self.risk.validate_trade(&intent, &portfolio)?;
        }

        // Registration invariant: the winning quote's venue is always in
        // the registry it was aggregated from.
        let provider =
            self.aggregator
                .provider(&quote.venue)
                .ok_or_else(|| TradeError::ExecutionFailure {
                    venue: quote.venue.clone(),
                    reason: "winning venue missing from registry".to_string(),
                })?;

        let fill = match provider.execute(&quote).await {
            Ok(fill) => fill,
            Err(error) => {
                self.metrics_sink.record_swap_failure(&quote.venue);
                warn!(venue = %quote.venue, error = %error, "Swap execution failed");
                self.alerts
                    .send_alert(AlertEvent {
                        level: AlertLevel::Critical,
                        kind: "execution".to_string(),
                        message: format!(
                            "swap submission failed on {}: {error}",
                            quote.venue
                        ),
                        threshold: None,
                        current: None,
                    })
                    .await;
                self.audit
                    .record(AuditRecord::new(
                        "swap_failed",
                        serde_json::json!({
                            "pair": symbol,
                            "venue": quote.venue,
                            "reason": error.to_string(),
                        }),
                        AlertLevel::Critical,
                    ))
                    .await;
                return Err(TradeError::ExecutionFailure {
                    venue: quote.venue.clone(),
                    reason: error.to_string(),
                });
            }
        };

        {
            let mut portfolio = self.portfolio.lock().await;
            portfolio.apply_fill(&symbol, base_amount, best_pool.price, request.leverage);
        }

        let notional = intent.notional();
        self.metrics_sink.record_swap(&quote.venue, notional);
        self.audit
            .record(AuditRecord::new(
                "swap_executed",
                serde_json::json!({
                    "pair": symbol,
                    "venue": quote.venue,
                    "input_amount": base_amount.to_string(),
                    "output_amount": fill.output_amount.to_string(),
                    "price_impact": fill.price_impact.to_string(),
                    "tx_hash": fill.tx_hash,
                }),
                AlertLevel::Info,
            ))
            .await;

        info!(
            pair = %symbol,
            venue = %quote.venue,
            notional = %notional,
            impact = %fill.price_impact,
            tx = %fill.tx_hash,
            "Swap executed"
        );

        Ok(SwapReceipt {
            status: SwapStatus::Completed,
            input_amount: base_amount,
            output_amount: fill.output_amount,
            price_impact: fill.price_impact,
            tx_hash: fill.tx_hash,
            venue: quote.venue,
        })
    }

    /// Close an open position at the given exit price.
    ///
    /// Realizes P&L into the portfolio and attributes the outcome to the
    /// currently active mode for the strategy metrics feedback loop.
    pub async fn close_position(
        &self,
        symbol: &str,
        exit_price: Decimal,
    ) -> Result<Decimal, TradeError> {
        let pnl = {
            let mut portfolio = self.portfolio.lock().await;
            let position = portfolio.positions.get(symbol).ok_or_else(|| {
                TradeError::validation("symbol", format!("no open position for {symbol}"))
            })?;
            let size = position.size;
            let leverage = position.leverage;
            let pnl = (exit_price - position.entry_price) * size;

            portfolio.apply_fill(symbol, -size, exit_price, leverage);
            portfolio.total_value += pnl;
            portfolio.free_collateral += pnl;
            pnl
        };

        let mode = *self.mode_rx.borrow();
        if let Err(error) = self
            .settlement_tx
            .send(ModeSettlement {
                mode,
                outcome: TradeOutcome {
                    pnl,
                    volatility: None,
                    sharpe_ratio: None,
                    drawdown: None,
                },
            })
            .await
        {
            warn!(error = %error, "Settlement feedback channel closed");
        }

        self.audit
            .record(AuditRecord::new(
                "position_closed",
                serde_json::json!({
                    "symbol": symbol,
                    "exit_price": exit_price.to_string(),
                    "pnl": pnl.to_string(),
                    "mode": mode.to_string(),
                }),
                AlertLevel::Info,
            ))
            .await;

        Ok(pnl)
    }

    /// Pass a gate result through, emitting the rejection alert and
    /// counter before propagating the error.
    async fn checked_gate(
        &self,
        result: Result<(), TradeError>,
        symbol: &str,
    ) -> Result<(), TradeError> {
        if let Err(TradeError::GateRejected {
            threshold,
            limit,
            observed,
        }) = &result
        {
            self.metrics_sink
                .record_gate_rejection(&threshold.to_string());
            self.alerts
                .send_alert(AlertEvent {
                    level: AlertLevel::Warning,
                    kind: threshold.to_string(),
                    message: format!("{symbol} rejected: {threshold} {observed} breaches {limit}"),
                    threshold: Some(*limit),
                    current: Some(*observed),
                })
                .await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::config::RiskConfig;
    use crate::domain::market::{PoolSnapshot, Quote, SwapFill};
    use crate::domain::sizing::SizingParams;
    use crate::ports::quote_provider::QuoteProvider;
    use crate::ports::telemetry::NullMetrics;

    struct StubVenue {
        venue: String,
        pool: PoolSnapshot,
        impact: Decimal,
        execution_fails: bool,
    }

    #[async_trait]
    impl QuoteProvider for StubVenue {
        fn venue(&self) -> &str {
            &self.venue
        }

        async fn quote(
            &self,
            input_token: &str,
            output_token: &str,
            amount: Decimal,
        ) -> anyhow::Result<Quote> {
            Ok(Quote {
                venue: self.venue.clone(),
                input_token: input_token.to_string(),
                output_token: output_token.to_string(),
                input_amount: amount,
                output_amount: amount * self.pool.price,
                price_impact: self.impact,
                route: String::new(),
                timestamp: Utc::now(),
            })
        }

        async fn pool_info(&self, _pair: &TokenPair) -> anyhow::Result<Option<PoolSnapshot>> {
            Ok(Some(self.pool.clone()))
        }

        async fn execute(&self, quote: &Quote) -> anyhow::Result<SwapFill> {
            if self.execution_fails {
                anyhow::bail!("rpc timeout");
            }
            Ok(SwapFill {
                output_amount: quote.output_amount,
                price_impact: quote.price_impact,
                tx_hash: "0xdeadbeef".to_string(),
            })
        }

        async fn is_healthy(&self) -> bool {
            true
        }
    }

    struct NullAlerts;

    #[async_trait]
    impl AlertSink for NullAlerts {
        async fn send_alert(&self, _event: AlertEvent) {}
    }

    struct NullAudit;

    #[async_trait]
    impl AuditSink for NullAudit {
        async fn record(&self, _record: AuditRecord) {}
    }

    #[derive(Default)]
    struct RecordingAlerts(std::sync::Mutex<Vec<AlertEvent>>);

    #[async_trait]
    impl AlertSink for RecordingAlerts {
        async fn send_alert(&self, event: AlertEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[derive(Default)]
    struct RecordingAudit(std::sync::Mutex<Vec<AuditRecord>>);

    #[async_trait]
    impl AuditSink for RecordingAudit {
        async fn record(&self, record: AuditRecord) {
            self.0.lock().unwrap().push(record);
        }
    }

    fn healthy_pool(venue: &str) -> PoolSnapshot {
        PoolSnapshot {
            venue: venue.to_string(),
            liquidity_usd: dec!(500000),
            volume_24h: dec!(200000),
            price: dec!(25),
            spread: dec!(0.001),
            base_reserves: dec!(40000),
            quote_reserves: dec!(1000000),
        }
    }

    fn coordinator_with(
        venues: Vec<Arc<dyn QuoteProvider>>,
        initial_value: Decimal,
        alerts: Arc<dyn AlertSink>,
        audit: Arc<dyn AuditSink>,
    ) -> (ExecutionCoordinator, mpsc::Receiver<ModeSettlement>) {
        let (_mode_tx, mode_rx) = watch::channel(TradingMode::DexSwap);
        let (settlement_tx, settlement_rx) = mpsc::channel(8);
        let risk_config = RiskConfig::default();
        let coordinator = ExecutionCoordinator::new(
            Arc::new(VenueAggregator::new(venues)),
            GateLimits::default(),
            RiskEngine::new(&risk_config),
            PositionSizer::new(
                SizingParams::default(),
                risk_config.max_position_size,
                risk_config.max_leverage,
            ),
            Portfolio::with_initial_value(initial_value),
            mode_rx,
            settlement_tx,
            alerts,
            audit,
            Arc::new(NullMetrics),
        );
        (coordinator, settlement_rx)
    }

    fn coordinator(
        venues: Vec<Arc<dyn QuoteProvider>>,
    ) -> (ExecutionCoordinator, mpsc::Receiver<ModeSettlement>) {
        coordinator_with(
            venues,
            dec!(1000000),
            Arc::new(NullAlerts),
            Arc::new(NullAudit),
        )
    }

    fn request() -> SwapRequest {
        SwapRequest::spot("SOL/USDC".parse().unwrap())
    }

    #[tokio::test]
    async fn test_full_pipeline_produces_receipt_and_position() {
        let (coordinator, _rx) = coordinator(vec![Arc::new(StubVenue {
            venue: "jupiter".to_string(),
            pool: healthy_pool("jupiter"),
            impact: dec!(0.005),
            execution_fails: false,
        })]);

        let receipt = coordinator.execute_swap(&request()).await.unwrap();
        assert_eq!(receipt.status, SwapStatus::Completed);
        assert_eq!(receipt.venue, "jupiter");
        // Default sizing with an empty portfolio: 1000 * 1.0 risk / 1
        // leverage * 0.8 volatility = 800 quote, 32 base at price 25.
        assert_eq!(receipt.input_amount, dec!(32));

        let portfolio = coordinator.portfolio().await;
        assert_eq!(portfolio.positions["SOL/USDC"].size, dec!(32));
    }

    #[tokio::test]
    async fn test_explicit_amount_bypasses_the_sizer() {
        let (coordinator, _rx) = coordinator(vec![Arc::new(StubVenue {
            venue: "jupiter".to_string(),
            pool: healthy_pool("jupiter"),
            impact: dec!(0.005),
            execution_fails: false,
        })]);

        let request = SwapRequest::sized("SOL/USDC".parse().unwrap(), dec!(5));
        let receipt = coordinator.execute_swap(&request).await.unwrap();
        assert_eq!(receipt.input_amount, dec!(5));
        assert_eq!(coordinator.portfolio().await.positions["SOL/USDC"].size, dec!(5));
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected_before_quoting() {
        let (coordinator, _rx) = coordinator(vec![Arc::new(StubVenue {
            venue: "jupiter".to_string(),
            pool: healthy_pool("jupiter"),
            impact: dec!(0.005),
            execution_fails: false,
        })]);

        let request = SwapRequest::sized("SOL/USDC".parse().unwrap(), Decimal::ZERO);
        let result = coordinator.execute_swap(&request).await;
        assert!(matches!(result, Err(TradeError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_shallow_pool_rejected_before_quoting() {
        let mut pool = healthy_pool("jupiter");
        pool.liquidity_usd = dec!(99999);
        let (coordinator, _rx) = coordinator(vec![Arc::new(StubVenue {
            venue: "jupiter".to_string(),
            pool,
            impact: dec!(0.005),
            execution_fails: false,
        })]);

        let result = coordinator.execute_swap(&request()).await;
        assert!(matches!(result, Err(TradeError::GateRejected { .. })));
        assert!(coordinator.portfolio().await.positions.is_empty());
    }

    #[tokio::test]
    async fn test_high_impact_quote_rejected() {
        let (coordinator, _rx) = coordinator(vec![Arc::new(StubVenue {
            venue: "jupiter".to_string(),
            pool: healthy_pool("jupiter"),
            impact: dec!(0.05),
            execution_fails: false,
        })]);

        let result = coordinator.execute_swap(&request()).await;
        assert!(matches!(result, Err(TradeError::GateRejected { .. })));
    }

    #[tokio::test]
    async fn test_fills_consume_collateral_until_margin_binds() {
        let (coordinator, _rx) = coordinator_with(
            vec![Arc::new(StubVenue {
                venue: "jupiter".to_string(),
                pool: healthy_pool("jupiter"),
                impact: dec!(0.005),
                execution_fails: false,
            })],
            dec!(1000),
            Arc::new(NullAlerts),
            Arc::new(NullAudit),
        );

        // 160 base at 25 = 4000 notional, 800 margin at 5x.
        let request = SwapRequest {
            pair: "SOL/USDC".parse().unwrap(),
            amount: Some(dec!(160)),
            leverage: dec!(5),
        };
        coordinator.execute_swap(&request).await.unwrap();
        assert_eq!(coordinator.portfolio().await.free_collateral, dec!(200));

        // The second identical trade no longer fits the remaining margin.
        let result = coordinator.execute_swap(&request).await;
        assert!(matches!(result, Err(TradeError::RiskRejected { .. })));
        assert_eq!(coordinator.portfolio().await.positions["SOL/USDC"].size, dec!(160));
    }

    #[tokio::test]
    async fn test_execution_failure_emits_alert_and_audit() {
        let alerts = Arc::new(RecordingAlerts::default());
        let audit = Arc::new(RecordingAudit::default());
        let (coordinator, _rx) = coordinator_with(
            vec![Arc::new(StubVenue {
                venue: "jupiter".to_string(),
                pool: healthy_pool("jupiter"),
                impact: dec!(0.005),
                execution_fails: true,
            })],
            dec!(1000000),
            Arc::clone(&alerts) as _,
            Arc::clone(&audit) as _,
        );

        let result = coordinator.execute_swap(&request()).await;
        assert!(matches!(result, Err(TradeError::ExecutionFailure { .. })));

        let alerts = alerts.0.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Critical);
        assert_eq!(alerts[0].kind, "execution");

        let records = audit.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "swap_failed");
        assert_eq!(records[0].details["venue"], "jupiter");
    }

    #[tokio::test]
    async fn test_execution_failure_leaves_portfolio_untouched() {
        let (coordinator, _rx) = coordinator(vec![Arc::new(StubVenue {
            venue: "jupiter".to_string(),
            pool: healthy_pool("jupiter"),
            impact: dec!(0.005),
            execution_fails: true,
        })]);

        let result = coordinator.execute_swap(&request()).await;
        assert!(matches!(result, Err(TradeError::ExecutionFailure { .. })));
        assert!(coordinator.portfolio().await.positions.is_empty());
    }

    #[tokio::test]
    async fn test_close_position_realizes_pnl_and_attributes_mode() {
        let (coordinator, mut settlement_rx) = coordinator(vec![Arc::new(StubVenue {
            venue: "jupiter".to_string(),
            pool: healthy_pool("jupiter"),
            impact: dec!(0.005),
            execution_fails: false,
        })]);

        coordinator.execute_swap(&request()).await.unwrap();
        // Entry 25, exit 27, 32 base units.
        let pnl = coordinator.close_position("SOL/USDC", dec!(27)).await.unwrap();
        assert_eq!(pnl, dec!(64));

        let portfolio = coordinator.portfolio().await;
        assert!(portfolio.positions.is_empty());
        assert_eq!(portfolio.total_value, dec!(1000064));
        // Entry margin (800) released on close, plus the realized P&L.
        assert_eq!(portfolio.free_collateral, dec!(1000064));

        let settlement = settlement_rx.recv().await.unwrap();
        assert_eq!(settlement.mode, TradingMode::DexSwap);
        assert_eq!(settlement.outcome.pnl, dec!(64));
    }

    #[tokio::test]
    async fn test_close_unknown_position_is_validation_error() {
        let (coordinator, _rx) = coordinator(vec![Arc::new(StubVenue {
            venue: "jupiter".to_string(),
            pool: healthy_pool("jupiter"),
            impact: dec!(0.005),
            execution_fails: false,
        })]);

        let result = coordinator.close_position("BONK/USDC", dec!(1)).await;
        assert!(matches!(result, Err(TradeError::Validation { .. })));
    }
}
