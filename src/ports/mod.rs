//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `QuoteProvider`: per-venue quote/pool-info/execute surface
//! - `AdvisorySource`: opaque strategy-mode recommendation signal
//! - `AlertSink` / `AuditSink`: outbound alert and audit event delivery

pub mod advisory;
pub mod quote_provider;
pub mod telemetry;
