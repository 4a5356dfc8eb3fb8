//! Adapters - Outer-Layer Implementations of the Ports
//!
//! Venue connectivity, telemetry delivery, advisory sources and the
//! observability surface. Everything here is replaceable without
//! touching domain or use-case code.

pub mod advisory;
pub mod metrics;
pub mod telemetry;
pub mod venues;
