//! Metrics and health adapters.

pub mod health;
pub mod prometheus;

pub use health::{HealthState, ObservabilityServer};
pub use prometheus::MetricsRegistry;
