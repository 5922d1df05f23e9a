//! Producer-facing batch accumulation and admission.

use std::mem;
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tracing::debug;

use crate::bail;
use crate::concurrency::gate::AdmissionGate;
use crate::error::{BridgeResult, ErrorKind};
use crate::metrics::{BRIDGE_BATCHES_SUBMITTED_TOTAL, BRIDGE_RECORDS_RECEIVED_TOTAL};
use crate::types::Batch;

/// Accumulates raw records into batches and submits them for dispatch.
///
/// [`RecordBatcher`] is the single producer handle of a pipeline. It submits
/// a batch once the configured number of records has accumulated, then
/// acquires one admission token before accepting further input; this couples
/// the ingestion rate to the pool's assignment rate without waiting for
/// writes to complete.
#[derive(Debug)]
pub struct RecordBatcher {
    intake_tx: mpsc::Sender<Batch>,
    gate: AdmissionGate,
    max_size: usize,
    drain_grace: Duration,
    records: Vec<String>,
}

impl RecordBatcher {
    pub(crate) fn new(
        intake_tx: mpsc::Sender<Batch>,
        gate: AdmissionGate,
        max_size: usize,
        drain_grace: Duration,
    ) -> Self {
        Self {
            intake_tx,
            gate,
            max_size,
            drain_grace,
            records: Vec::with_capacity(max_size),
        }
    }

    /// Accepts one raw record.
    ///
    /// When the accumulated count reaches the batch size, the batch is
    /// submitted and one admission token is acquired before this method
    /// returns, suspending the caller while no worker assignment capacity is
    /// available.
    pub async fn push(&mut self, record: String) -> BridgeResult<()> {
        counter!(BRIDGE_RECORDS_RECEIVED_TOTAL).increment(1);
        self.records.push(record);

        if self.records.len() >= self.max_size {
            self.submit().await?;
            self.gate.acquire().await?;
        }

        Ok(())
    }

    /// Returns the number of records accumulated but not yet submitted.
    pub fn pending(&self) -> usize {
        self.records.len()
    }

    /// Flushes any partial batch and grants it the drain grace period.
    ///
    /// Called on final drain, before shutdown is initiated, so the last batch
    /// can be picked up by a worker. The flush path does not acquire an
    /// admission token: the gate only throttles further input and there is
    /// none after drain.
    pub async fn flush(&mut self) -> BridgeResult<()> {
        if !self.records.is_empty() {
            self.submit().await?;
        }

        tokio::time::sleep(self.drain_grace).await;

        Ok(())
    }

    async fn submit(&mut self) -> BridgeResult<()> {
        let records = mem::replace(&mut self.records, Vec::with_capacity(self.max_size));
        let batch = Batch::new(records);

        debug!(records = batch.len(), "submitting batch");

        if self.intake_tx.send(batch).await.is_err() {
            bail!(
                ErrorKind::InvalidState,
                "Dispatcher is gone",
                "the pipeline dispatcher stopped accepting batches"
            );
        }

        counter!(BRIDGE_BATCHES_SUBMITTED_TOTAL).increment(1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batcher_with_channel(
        max_size: usize,
        intake_capacity: usize,
    ) -> (RecordBatcher, mpsc::Receiver<Batch>, AdmissionGate) {
        let (intake_tx, intake_rx) = mpsc::channel(intake_capacity);
        let gate = AdmissionGate::new();
        let batcher =
            RecordBatcher::new(intake_tx, gate.clone(), max_size, Duration::from_millis(1));

        (batcher, intake_rx, gate)
    }

    #[tokio::test]
    async fn submits_once_threshold_is_reached() {
        let (mut batcher, mut intake_rx, gate) = batcher_with_channel(3, 1);
        // Pre-release a token so the threshold push does not suspend.
        gate.release();

        batcher.push("a".to_string()).await.unwrap();
        batcher.push("b".to_string()).await.unwrap();
        assert_eq!(batcher.pending(), 2);

        batcher.push("c".to_string()).await.unwrap();
        assert_eq!(batcher.pending(), 0);

        let batch = intake_rx.recv().await.unwrap();
        assert_eq!(batch.records(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn threshold_push_suspends_until_admission() {
        let (mut batcher, mut intake_rx, gate) = batcher_with_channel(1, 1);

        let suspended = tokio::time::timeout(
            Duration::from_millis(20),
            batcher.push("a".to_string()),
        )
        .await;
        assert!(suspended.is_err(), "push must suspend on the admission gate");

        // The batch itself was still submitted before the gate acquisition.
        let batch = intake_rx.recv().await.unwrap();
        assert_eq!(batch.len(), 1);

        gate.release();
        batcher.push("b".to_string()).await.unwrap();
        assert_eq!(batcher.pending(), 0);
    }

    #[tokio::test]
    async fn flush_submits_partial_batch_without_admission() {
        let (mut batcher, mut intake_rx, _gate) = batcher_with_channel(10, 1);

        batcher.push("a".to_string()).await.unwrap();
        batcher.push("b".to_string()).await.unwrap();
        batcher.flush().await.unwrap();

        let batch = intake_rx.recv().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batcher.pending(), 0);
    }

    #[tokio::test]
    async fn flush_without_pending_records_submits_nothing() {
        let (mut batcher, mut intake_rx, _gate) = batcher_with_channel(10, 1);

        batcher.flush().await.unwrap();

        assert!(intake_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn submit_fails_once_dispatcher_is_gone() {
        let (mut batcher, intake_rx, _gate) = batcher_with_channel(1, 1);
        drop(intake_rx);

        let result = batcher.push("a".to_string()).await;
        assert_eq!(
            result.unwrap_err().kind(),
            crate::error::ErrorKind::InvalidState
        );
    }
}
