//! Telemetry Ports - Alert and Audit Event Boundaries
//!
//! The core only EMITS these events; delivery and storage are external
//! collaborators (Telegram, database, SIEM...). Sinks must be cheap and
//! non-blocking from the caller's perspective.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

/// A structured alert event, e.g. a threshold breach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Severity of the alert.
    pub level: AlertLevel,
    /// Machine-checkable alert kind (e.g. "price_impact", "spread").
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// The configured threshold, when the alert is a threshold breach.
    pub threshold: Option<Decimal>,
    /// The observed value that triggered the alert.
    pub current: Option<Decimal>,
}

/// A structured audit record for the external audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record id.
    pub id: Uuid,
    /// Action performed (e.g. "swap_executed", "mode_switch").
    pub action: String,
    /// Free-form structured details.
    pub details: serde_json::Value,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// Severity classification for downstream filtering.
    pub severity: AlertLevel,
}

impl AuditRecord {
    /// Build a record stamped with a fresh id and the current time.
    pub fn new(action: impl Into<String>, details: serde_json::Value, severity: AlertLevel) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.into(),
            details,
            timestamp: Utc::now(),
            severity,
        }
    }
}

/// Sink for alert events.
#[async_trait]
pub trait AlertSink: Send + Sync + 'static {
    /// Emit an alert. Failures are the sink's problem; callers never
    /// fail a trade because an alert could not be delivered.
    async fn send_alert(&self, event: AlertEvent);
}

/// Sink for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    /// Append a record to the audit trail.
    async fn record(&self, record: AuditRecord);
}

/// Sink for operational counters.
///
/// Synchronous on purpose: the implementation is expected to be a set of
/// in-process counters (Prometheus registry), never I/O.
pub trait MetricsSink: Send + Sync + 'static {
    /// A swap completed on `venue` moving `volume_usd` of notional.
    fn record_swap(&self, venue: &str, volume_usd: Decimal);
    /// A swap attempt on `venue` failed at execution.
    fn record_swap_failure(&self, venue: &str);
    /// A trade was rejected by a liquidity gate threshold.
    fn record_gate_rejection(&self, threshold: &str);
    /// The strategy mode switched.
    fn record_mode_switch(&self, to_mode: &str);
}

/// No-op metrics sink for tests and metrics-disabled runs.
#[derive(Debug, Default)]
pub struct NullMetrics;

impl MetricsSink for NullMetrics {
    fn record_swap(&self, _venue: &str, _volume_usd: Decimal) {}
    fn record_swap_failure(&self, _venue: &str) {}
    fn record_gate_rejection(&self, _threshold: &str) {}
    fn record_mode_switch(&self, _to_mode: &str) {}
}
