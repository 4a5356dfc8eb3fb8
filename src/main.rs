//! Solana DEX Bot — Entry Point
//!
//! Initializes configuration, logging, the venue registry, and the
//! trading engines. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build the venue registry (paper venues in dry-run) in config order
//! 4. Create the Prometheus registry and telemetry sinks
//! 5. Create the strategy mode controller (mode watch + settlement channel)
//! 6. Create the execution coordinator over the aggregator
//! 7. Spawn the observability server (/live + /ready + /metrics)
//! 8. Spawn the mode controller loop
//! 9. Run the trading loop over the watched pairs
//! 10. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::advisory::HeuristicAdvisory;
use adapters::metrics::{HealthState, MetricsRegistry, ObservabilityServer};
use adapters::telemetry::{TracingAlertSink, TracingAuditSink};
use adapters::venues::PaperVenue;
use domain::error::TradeError;
use domain::sizing::PositionSizer;
use domain::{GateLimits, Portfolio};
use ports::quote_provider::QuoteProvider;
use usecases::{ExecutionCoordinator, RiskEngine, StrategyModeController, SwapRequest, VenueAggregator};

/// How often venue health is folded into the readiness state.
const VENUE_HEALTH_POLL: std::time::Duration = std::time::Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.bot.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.bot.dry_run,
        venues = config.venues.len(),
        "Starting Solana DEX Bot"
    );
    info!(
        min_liquidity = %config.gate.min_liquidity_usd,
        max_impact = %config.gate.max_price_impact,
        mode = %config.strategy.initial_mode,
        "Configuration loaded"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Build the venue registry in config order ─────────
    if !config.bot.dry_run {
        warn!("Live venue connectors not configured — running paper venues");
    }
    let providers: Vec<Arc<dyn QuoteProvider>> = config
        .venues
        .iter()
        .filter(|venue| venue.enabled)
        .map(|venue| Arc::new(PaperVenue::from_config(venue)) as Arc<dyn QuoteProvider>)
        .collect();
    let aggregator = Arc::new(VenueAggregator::new(providers));
    info!(venues = ?aggregator.venues(), "Venue registry built");

    // ── 5. Metrics registry and telemetry sinks ─────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);
    let alerts = Arc::new(TracingAlertSink);
    let audit = Arc::new(TracingAuditSink);
    let gate_limits = GateLimits::from(&config.gate);

    // ── 6. Strategy mode controller ─────────────────────────
    let (mode_controller, mode_handles) = StrategyModeController::new(
        Arc::clone(&aggregator),
        Arc::new(HeuristicAdvisory),
        Arc::clone(&audit) as _,
        Arc::clone(&metrics) as _,
        config.strategy.clone(),
        gate_limits.clone(),
        shutdown_tx.subscribe(),
    );

    // ── 7. Execution coordinator ────────────────────────────
    let coordinator = Arc::new(ExecutionCoordinator::new(
        Arc::clone(&aggregator),
        gate_limits,
        RiskEngine::new(&config.risk),
        PositionSizer::new(
            (&config.sizing).into(),
            config.risk.max_position_size,
            config.risk.max_leverage,
        ),
        Portfolio::with_initial_value(config.risk.initial_portfolio_value),
        mode_handles.mode_rx.clone(),
        mode_handles.settlement_tx.clone(),
        Arc::clone(&alerts) as _,
        Arc::clone(&audit) as _,
        Arc::clone(&metrics) as _,
    ));

    // ── 8. Spawn observability server + venue health poll ───
    let health = Arc::new(HealthState::new());
    let server_handle = if config.metrics.enabled {
        let server = ObservabilityServer::new(
            Arc::clone(&health),
            Arc::clone(&metrics),
            config.metrics.bind_address.clone(),
        );
        let server_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(server_shutdown).await {
                error!(error = %e, "Observability server failed");
            }
        }))
    } else {
        None
    };
    let health_aggregator = Arc::clone(&aggregator);
    let health_state = Arc::clone(&health);
    let mut health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        let mut poll = tokio::time::interval(VENUE_HEALTH_POLL);
        loop {
            tokio::select! {
                biased;
                _ = health_shutdown.recv() => break,
                _ = poll.tick() => {
                    let healthy = health_aggregator.any_healthy().await;
                    health_state
                        .venues_healthy
                        .store(healthy, std::sync::atomic::Ordering::Relaxed);
                }
            }
        }
    });

    // ── 9. Spawn mode controller loop ───────────────────────
    let controller_handle = tokio::spawn(mode_controller.run());

    // ── 10. Spawn trading loop ──────────────────────────────
    let trade_shutdown = shutdown_tx.subscribe();
    let trade_config = config.clone();
    let trade_coordinator = Arc::clone(&coordinator);
    let trade_metrics = Arc::clone(&metrics);
    let trade_handle = tokio::spawn(async move {
        run_trading_loop(trade_config, trade_coordinator, trade_metrics, trade_shutdown).await;
    });

    info!("All tasks spawned — bot is running");

    // ── 11. Wait for SIGINT ─────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    // Signal all tasks, flip readiness to 503, then drain.
    let _ = shutdown_tx.send(());
    health
        .engine_running
        .store(false, std::sync::atomic::Ordering::Relaxed);

    let _ = tokio::time::timeout(std::time::Duration::from_secs(30), trade_handle).await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(10), controller_handle).await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), health_handle).await;
    if let Some(handle) = server_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Periodically attempt a gated swap on each watched pair.
///
/// Gate and risk rejections are routine and logged at info; anything
/// else is an error worth a warning. The loop never exits on a failed
/// attempt, only on shutdown.
async fn run_trading_loop(
    config: config::AppConfig,
    coordinator: Arc<ExecutionCoordinator>,
    metrics: Arc<MetricsRegistry>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let pairs: Vec<domain::TokenPair> = config
        .strategy
        .watch_pairs
        .iter()
        .filter_map(|p| p.parse().ok())
        .collect();

    if pairs.is_empty() {
        warn!("No watch pairs configured — trading loop idle");
        let _ = shutdown_rx.recv().await;
        return;
    }

    let interval = std::time::Duration::from_secs(config.strategy.poll_interval_secs);
    info!(pairs = pairs.len(), interval_secs = config.strategy.poll_interval_secs, "Trading loop started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("Trading loop received shutdown signal");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                for pair in &pairs {
                    let request = SwapRequest::spot(pair.clone());
                    match coordinator.execute_swap(&request).await {
                        Ok(receipt) => {
                            info!(
                                pair = %pair,
                                venue = %receipt.venue,
                                output = %receipt.output_amount,
                                "Swap completed"
                            );
                        }
                        Err(
                            error @ (TradeError::GateRejected { .. }
                            | TradeError::RiskRejected { .. }),
                        ) => {
                            info!(pair = %pair, reason = %error, "Trade skipped");
                        }
                        Err(error) => {
                            warn!(pair = %pair, error = %error, "Swap attempt failed");
                        }
                    }
                }
                let portfolio = coordinator.portfolio().await;
                metrics.set_portfolio_value(portfolio.total_value);
            }
        }
    }

    info!("Trading loop stopped cleanly");
}
