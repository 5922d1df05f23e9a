//! Bridge service binary.
//!
//! Initializes and runs the ingestion pipeline that batches stream records
//! and delivers them to the configured sink. Includes telemetry, error
//! handling, and graceful shutdown.

use pgbridge_config::shared::BridgeConfig;
use pgbridge_telemetry::metrics::init_metrics;
use pgbridge_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_bridge_config;
use crate::core::start_bridge_with_config;
use crate::error::{IngestError, IngestResult};

mod config;
mod core;
mod error;

/// Entry point for the bridge service.
///
/// Loads configuration, initializes tracing, starts the async runtime, and
/// launches the pipeline.
fn main() -> IngestResult<()> {
    let bridge_config = load_bridge_config()?;

    init_tracing(env!("CARGO_BIN_NAME")).map_err(IngestError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(bridge_config))?;

    Ok(())
}

/// Main async entry point that starts the bridge pipeline.
async fn async_main(bridge_config: BridgeConfig) -> IngestResult<()> {
    // The metrics exporter needs a running runtime, so it is initialized here
    // rather than in `main`.
    init_metrics(bridge_config.telemetry.metrics_port).map_err(IngestError::config)?;

    if let Err(err) = start_bridge_with_config(bridge_config).await {
        error!("{err}");

        return Err(err);
    }

    Ok(())
}
