use pgbridge::batcher::RecordBatcher;
use pgbridge::pipeline::IngestPipeline;
use pgbridge::sink::Sink;
use pgbridge::sink::memory::MemorySink;
use pgbridge::sink::postgres::PostgresSink;
use pgbridge_config::shared::{
    BatchConfig, BridgeConfig, PgConnectionConfig, PipelineConfig, PoolConfig, SinkConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info};

use crate::error::IngestResult;

/// Starts the bridge service with the provided configuration.
///
/// Creates the configured sink and runs the ingestion pipeline against it.
/// Each sink variant is dispatched statically; this is more verbose than a
/// boxed sink, but keeps the write path monomorphized.
pub async fn start_bridge_with_config(bridge_config: BridgeConfig) -> IngestResult<()> {
    info!("starting bridge service");

    log_config(&bridge_config);

    match &bridge_config.sink {
        SinkConfig::Memory => {
            let sink = MemorySink::new();

            run_pipeline(bridge_config.pipeline.clone(), sink).await?;
        }
        SinkConfig::Postgres { connection, table } => {
            let sink = PostgresSink::new(connection, table);

            run_pipeline(bridge_config.pipeline.clone(), sink).await?;
        }
    }

    info!("bridge service completed");

    Ok(())
}

/// Runs one pipeline to completion: records in, drain, shutdown.
async fn run_pipeline<K>(config: PipelineConfig, sink: K) -> IngestResult<()>
where
    K: Sink + Clone + Send + Sync + 'static,
{
    let mut pipeline = IngestPipeline::new(config, sink);
    pipeline.start()?;
    let mut batcher = pipeline.take_batcher()?;

    consume_records(&mut batcher).await?;

    // Drain before initiating shutdown so the final partial batch gets its
    // grace period; a batch enqueued after the stop signal is raised may
    // never be picked up.
    batcher.flush().await?;
    drop(batcher);

    pipeline.shutdown_and_wait().await?;

    Ok(())
}

/// Feeds newline-delimited records from stdin into the batcher until the
/// stream ends or a termination signal arrives.
///
/// The upstream message-stream client is an external collaborator: anything
/// that can write records to this process's stdin can feed the bridge.
async fn consume_records(batcher: &mut RecordBatcher) -> IngestResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Listen for SIGTERM, sent by orchestrators before SIGKILL during
    // termination, alongside SIGINT for interactive use.
    let mut sigterm = signal(SignalKind::terminate())?;
    let sigint = tokio::signal::ctrl_c();
    tokio::pin!(sigint);

    loop {
        tokio::select! {
            maybe_line = lines.next_line() => match maybe_line? {
                Some(line) => {
                    if line.is_empty() {
                        continue;
                    }

                    batcher.push(line).await?;
                }
                None => {
                    info!("record stream ended, draining");
                    break;
                }
            },
            _ = &mut sigint => {
                info!("sigint (ctrl+c) received, draining and shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("sigterm received, draining and shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn log_config(config: &BridgeConfig) {
    log_sink_config(&config.sink);
    log_batch_config(&config.pipeline.batch);
    log_pool_config(&config.pipeline.pool);
}

fn log_sink_config(config: &SinkConfig) {
    match config {
        SinkConfig::Memory => {
            debug!("using memory sink config");
        }
        SinkConfig::Postgres { connection, table } => {
            debug!(table, "using postgres sink config");
            log_pg_connection_config(connection);
        }
    }
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    debug!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        "sink postgres connection config",
    );
}

fn log_batch_config(config: &BatchConfig) {
    debug!(max_size = config.max_size, "batch config");
}

fn log_pool_config(config: &PoolConfig) {
    debug!(
        workers = config.workers,
        effective_workers = config.effective_workers(),
        write_timeout_ms = config.write_timeout_ms,
        max_write_attempts = config.max_write_attempts,
        drain_grace_ms = config.drain_grace_ms,
        "pool config"
    );
}
