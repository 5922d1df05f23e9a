use std::time::Instant;

use metrics::{counter, histogram};
use pg_escape::quote_identifier;
use pgbridge_config::shared::PgConnectionConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, warn};

use crate::bail;
use crate::error::{BridgeResult, ErrorKind};
use crate::metrics::{
    BRIDGE_RECORDS_SKIPPED_TOTAL, BRIDGE_RECORDS_WRITTEN_TOTAL, BRIDGE_WRITE_DURATION_SECONDS,
};
use crate::sink::base::{Sink, WriteContext};
use crate::types::{Batch, MetricRecord};

/// Maximum number of pooled connections to the target database.
const MAX_POOL_CONNECTIONS: u32 = 10;

/// Sink that loads each batch into a Postgres table in a single transaction.
///
/// Records are parsed as metric samples and loaded via `COPY ... FROM STDIN`;
/// unparseable records are logged and skipped rather than failing the batch.
/// Each write attempt runs in its own transaction, so an abandoned attempt
/// that is still in flight cannot interfere with a retry.
///
/// The target table must exist with columns `(time, name, value, labels)`;
/// schema management belongs to the operator, not the bridge.
#[derive(Debug, Clone)]
pub struct PostgresSink {
    pool: PgPool,
    copy_statement: String,
}

impl PostgresSink {
    /// Creates a sink writing to `table` on the configured database.
    ///
    /// Connections are established lazily on first use.
    pub fn new(connection: &PgConnectionConfig, table: &str) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_POOL_CONNECTIONS)
            .connect_lazy_with(connection.with_db());

        Self {
            pool,
            copy_statement: copy_statement(table),
        }
    }

    /// Renders the parseable records of a batch as COPY text-format rows.
    ///
    /// Returns the rendered buffer and the number of rows it contains.
    fn render_rows(&self, batch: &Batch) -> BridgeResult<(String, u64)> {
        let mut rows = String::new();
        let mut rendered = 0u64;
        let mut skipped = 0u64;

        for raw in batch.records() {
            match MetricRecord::parse(raw) {
                Ok(record) => {
                    rows.push_str(&record.copy_row()?);
                    rows.push('\n');
                    rendered += 1;
                }
                Err(err) => {
                    warn!(error = %err, "skipping unparseable record");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            counter!(BRIDGE_RECORDS_SKIPPED_TOTAL).increment(skipped);
        }

        Ok((rows, rendered))
    }
}

impl Sink for PostgresSink {
    fn name() -> &'static str {
        "postgres"
    }

    async fn write(&self, ctx: WriteContext, batch: Batch) -> BridgeResult<()> {
        debug!(
            worker_id = ctx.worker_id,
            attempt = ctx.attempt,
            records = batch.len(),
            "start shipping batch"
        );

        let started = Instant::now();

        let (rows, rendered) = self.render_rows(&batch)?;
        if rendered == 0 {
            debug!(
                worker_id = ctx.worker_id,
                attempt = ctx.attempt,
                "no loadable records in batch"
            );
            return Ok(());
        }

        if ctx.cancellation.is_cancelled() {
            bail!(
                ErrorKind::WriteCanceled,
                "Write attempt abandoned before load",
                "the attempt deadline elapsed while rendering rows"
            );
        }

        let mut tx = self.pool.begin().await?;
        let mut copy = (&mut *tx).copy_in_raw(&self.copy_statement).await?;
        copy.send(rows.as_bytes()).await?;
        let copied = copy.finish().await?;

        if ctx.cancellation.is_cancelled() {
            tx.rollback().await?;
            bail!(
                ErrorKind::WriteCanceled,
                "Write attempt abandoned before commit",
                "the attempt deadline elapsed while loading rows"
            );
        }

        tx.commit().await?;

        let elapsed = started.elapsed();
        counter!(BRIDGE_RECORDS_WRITTEN_TOTAL).increment(copied);
        histogram!(BRIDGE_WRITE_DURATION_SECONDS).record(elapsed.as_secs_f64());

        debug!(
            worker_id = ctx.worker_id,
            attempt = ctx.attempt,
            records = copied,
            elapsed_ms = elapsed.as_millis() as u64,
            "finished shipping batch"
        );

        Ok(())
    }
}

/// Builds the COPY statement for the target table.
fn copy_statement(table: &str) -> String {
    format!(
        "COPY {} (time, name, value, labels) FROM STDIN",
        quote_identifier(table)
    )
}
