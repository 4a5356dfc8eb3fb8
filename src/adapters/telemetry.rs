//! Tracing-Backed Telemetry Sinks
//!
//! Default alert and audit sinks that route everything into the
//! structured log stream. External delivery (Telegram, a database audit
//! trail) slots in behind the same ports without touching the core.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::ports::telemetry::{AlertEvent, AlertLevel, AlertSink, AuditRecord, AuditSink};

/// Alert sink that writes alerts as structured log events.
#[derive(Debug, Default)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn send_alert(&self, event: AlertEvent) {
        let threshold = event.threshold.map(|t| t.to_string());
        let current = event.current.map(|c| c.to_string());
        match event.level {
            AlertLevel::Info => info!(
                kind = %event.kind,
                threshold = threshold.as_deref(),
                current = current.as_deref(),
                "{}", event.message
            ),
            AlertLevel::Warning => warn!(
                kind = %event.kind,
                threshold = threshold.as_deref(),
                current = current.as_deref(),
                "{}", event.message
            ),
            AlertLevel::Critical => error!(
                kind = %event.kind,
                threshold = threshold.as_deref(),
                current = current.as_deref(),
                "{}", event.message
            ),
        }
    }
}

/// Audit sink that appends records to the log stream as JSON.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: AuditRecord) {
        info!(
            audit_id = %record.id,
            action = %record.action,
            details = %record.details,
            "Audit record"
        );
    }
}
