use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::bridge_error;
use crate::concurrency::cancellation::create_cancellation;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{BridgeError, ErrorKind};
use crate::metrics::{
    BRIDGE_BATCHES_DELIVERED_TOTAL, BRIDGE_BATCHES_DROPPED_TOTAL, BRIDGE_WRITE_FAILURES_TOTAL,
    REASON_LABEL, WORKER_ID_LABEL,
};
use crate::sink::{Sink, WriteContext};
use crate::types::Batch;
use crate::workers::registry::IdleWorkers;

/// Outcome of a single write attempt.
enum AttemptOutcome {
    /// The sink stored the batch.
    Success,
    /// The sink reported an error.
    Failed(BridgeError),
    /// The attempt deadline elapsed before the sink responded.
    TimedOut,
}

/// A long-lived worker that executes write attempts against the sink for one
/// batch at a time.
///
/// Between batches the worker advertises itself in the idle registry; a stop
/// signal observed in any waiting state is terminal and the worker never
/// re-registers afterwards.
#[derive(Debug)]
pub struct WriteWorker<K> {
    id: usize,
    sink: K,
    idle: IdleWorkers,
    inbox_tx: mpsc::Sender<Batch>,
    inbox_rx: mpsc::Receiver<Batch>,
    write_timeout: Duration,
    max_attempts: u32,
    shutdown_rx: ShutdownRx,
}

impl<K> WriteWorker<K>
where
    K: Sink + Clone + Send + Sync + 'static,
{
    /// Creates a worker with a fresh private inbox.
    pub fn new(
        id: usize,
        sink: K,
        idle: IdleWorkers,
        write_timeout: Duration,
        max_attempts: u32,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::channel(1);

        Self {
            id,
            sink,
            idle,
            inbox_tx,
            inbox_rx,
            write_timeout,
            max_attempts,
            shutdown_rx,
        }
    }

    /// Runs the worker loop until the stop signal is observed.
    ///
    /// Returns the worker id so the pool can attribute the join result.
    pub(crate) async fn run(mut self) -> usize {
        debug!(worker_id = self.id, "write worker started");

        loop {
            // Stop is checked before and independently of registration, so a
            // full registry can never keep a worker from observing it.
            if self.shutdown_rx.is_shutdown() {
                break;
            }

            tokio::select! {
                biased;
                _ = self.shutdown_rx.wait_for_shutdown() => break,
                published = self.idle.publish(self.inbox_tx.clone()) => {
                    if !published {
                        // Registry torn down: the pipeline is gone.
                        break;
                    }
                }
            }

            tokio::select! {
                biased;
                maybe_batch = self.inbox_rx.recv() => match maybe_batch {
                    Some(batch) => self.process_batch(batch).await,
                    None => break,
                },
                _ = self.shutdown_rx.wait_for_shutdown() => {
                    // A batch may have been delivered concurrently with the
                    // stop signal; give it its attempts before exiting.
                    if let Ok(batch) = self.inbox_rx.try_recv() {
                        self.process_batch(batch).await;
                    }
                    break;
                }
            }
        }

        debug!(worker_id = self.id, "write worker stopping");

        self.id
    }

    /// Runs the attempt loop for one batch.
    ///
    /// Attempts are strictly sequential. The batch is discarded after the
    /// first success or once all attempts are exhausted; exhausted batches
    /// are never retried again, and the loss is only observable via the
    /// dropped counter and the error log.
    async fn process_batch(&self, batch: Batch) {
        let records = batch.len();

        for attempt in 1..=self.max_attempts {
            match self.attempt_write(batch.clone(), attempt).await {
                AttemptOutcome::Success => {
                    counter!(
                        BRIDGE_BATCHES_DELIVERED_TOTAL,
                        WORKER_ID_LABEL => self.id.to_string()
                    )
                    .increment(1);

                    debug!(worker_id = self.id, attempt, records, "batch delivered");

                    return;
                }
                AttemptOutcome::Failed(err) => {
                    counter!(
                        BRIDGE_WRITE_FAILURES_TOTAL,
                        WORKER_ID_LABEL => self.id.to_string(),
                        REASON_LABEL => "error"
                    )
                    .increment(1);

                    warn!(
                        worker_id = self.id,
                        attempt,
                        error = %err,
                        "write attempt failed"
                    );
                }
                AttemptOutcome::TimedOut => {
                    counter!(
                        BRIDGE_WRITE_FAILURES_TOTAL,
                        WORKER_ID_LABEL => self.id.to_string(),
                        REASON_LABEL => "timeout"
                    )
                    .increment(1);

                    warn!(
                        worker_id = self.id,
                        attempt,
                        timeout_ms = self.write_timeout.as_millis() as u64,
                        "write attempt timed out"
                    );
                }
            }
        }

        counter!(BRIDGE_BATCHES_DROPPED_TOTAL).increment(1);
        error!(
            worker_id = self.id,
            records,
            attempts = self.max_attempts,
            "dropping batch after exhausting write attempts"
        );
    }

    /// Performs one deadline-bounded write attempt.
    ///
    /// The write runs as its own task so that a timed-out attempt can keep
    /// running in the background; the cancellation signal is raised on
    /// timeout and the sink is responsible for observing it.
    async fn attempt_write(&self, batch: Batch, attempt: u32) -> AttemptOutcome {
        let (cancel_tx, cancel_rx) = create_cancellation();
        let ctx = WriteContext::new(self.id, attempt, cancel_rx);

        let sink = self.sink.clone();
        let write = tokio::spawn(async move { sink.write(ctx, batch).await });

        match timeout(self.write_timeout, write).await {
            Ok(Ok(Ok(()))) => AttemptOutcome::Success,
            Ok(Ok(Err(err))) => AttemptOutcome::Failed(err),
            Ok(Err(join_err)) => AttemptOutcome::Failed(bridge_error!(
                ErrorKind::SinkPanic,
                "Sink write task panicked",
                join_err
            )),
            Err(_) => {
                cancel_tx.cancel();
                AttemptOutcome::TimedOut
            }
        }
    }
}
