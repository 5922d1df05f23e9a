//! Shared configuration types for the bridge.

mod base;
mod batch;
mod bridge;
mod connection;
mod pipeline;
mod pool;
mod sink;
mod telemetry;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use bridge::BridgeConfig;
pub use connection::PgConnectionConfig;
pub use pipeline::PipelineConfig;
pub use pool::PoolConfig;
pub use sink::SinkConfig;
pub use telemetry::TelemetryConfig;
