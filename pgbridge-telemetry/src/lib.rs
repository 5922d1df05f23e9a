//! Telemetry initialization for bridge services.

pub mod metrics;
pub mod tracing;
