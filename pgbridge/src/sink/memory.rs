use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::BridgeResult;
use crate::sink::base::{Sink, WriteContext};
use crate::types::Batch;

#[derive(Debug, Default)]
struct Inner {
    batches: Vec<Batch>,
}

/// In-memory sink for testing and development purposes.
///
/// [`MemorySink`] keeps every delivered batch in process memory, making it
/// useful for inspecting pipeline behavior without a database. All data is
/// lost when the process terminates.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySink {
    /// Creates a new empty memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all batches delivered to this sink.
    pub async fn batches(&self) -> Vec<Batch> {
        let inner = self.inner.lock().await;
        inner.batches.clone()
    }

    /// Returns the total number of records across all delivered batches.
    pub async fn record_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.batches.iter().map(Batch::len).sum()
    }

    /// Clears all stored batches.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.batches.clear();
    }
}

impl Sink for MemorySink {
    fn name() -> &'static str {
        "memory"
    }

    async fn write(&self, ctx: WriteContext, batch: Batch) -> BridgeResult<()> {
        let mut inner = self.inner.lock().await;

        info!(
            worker_id = ctx.worker_id,
            attempt = ctx.attempt,
            records = batch.len(),
            "storing batch in memory"
        );
        inner.batches.push(batch);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::cancellation::create_cancellation;

    #[tokio::test]
    async fn stores_delivered_batches() {
        let sink = MemorySink::new();
        let (_cancel_tx, cancel_rx) = create_cancellation();

        sink.write(
            WriteContext::new(1, 1, cancel_rx),
            Batch::new(vec!["a".to_string(), "b".to_string()]),
        )
        .await
        .unwrap();

        assert_eq!(sink.batches().await.len(), 1);
        assert_eq!(sink.record_count().await, 2);

        sink.clear().await;
        assert_eq!(sink.record_count().await, 0);
    }
}
