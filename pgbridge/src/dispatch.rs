//! The admission point pairing incoming batches with idle workers.

use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::concurrency::gate::AdmissionGate;
use crate::concurrency::shutdown::ShutdownRx;
use crate::metrics::BRIDGE_BATCHES_DROPPED_TOTAL;
use crate::types::Batch;
use crate::workers::registry::IdleWorkers;

/// Receives batches from the producer and pairs each with an idle worker.
///
/// Every batch gets its own pairing task, so slow worker availability for one
/// batch does not block the pairing of a later batch whose worker is already
/// idle. Assignment order across batches is therefore best-effort FIFO, not
/// guaranteed FIFO.
#[derive(Debug)]
pub struct Dispatcher {
    intake_rx: mpsc::Receiver<Batch>,
    idle: IdleWorkers,
    gate: AdmissionGate,
    shutdown_rx: ShutdownRx,
    pairings: JoinSet<()>,
}

impl Dispatcher {
    /// Creates a dispatcher reading from the given intake channel.
    pub fn new(
        intake_rx: mpsc::Receiver<Batch>,
        idle: IdleWorkers,
        gate: AdmissionGate,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            intake_rx,
            idle,
            gate,
            shutdown_rx,
            pairings: JoinSet::new(),
        }
    }

    /// Spawns the dispatcher loop as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        debug!("dispatcher started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.wait_for_shutdown() => break,
                maybe_batch = self.intake_rx.recv() => match maybe_batch {
                    Some(batch) => self.spawn_pairing(batch),
                    // Intake closed: the producer is done submitting.
                    None => break,
                },
                Some(_) = self.pairings.join_next(), if !self.pairings.is_empty() => {}
            }
        }

        // A batch still queued here was submitted after shutdown was raised;
        // drop it with a visible record rather than silently.
        while let Ok(batch) = self.intake_rx.try_recv() {
            counter!(BRIDGE_BATCHES_DROPPED_TOTAL).increment(1);
            warn!(
                records = batch.len(),
                "dropping batch still queued at dispatcher exit"
            );
        }

        // Let in-flight pairings finish; each observes shutdown on its own.
        while self.pairings.join_next().await.is_some() {}

        debug!("dispatcher stopping");
    }

    /// Spawns an independent pairing task for one batch.
    ///
    /// The task takes one idle worker inbox (suspending while none is idle),
    /// releases one admission token, and delivers the batch. A pairing still
    /// waiting for a worker when shutdown fires drops the batch with a
    /// warning rather than stalling shutdown forever.
    fn spawn_pairing(&mut self, batch: Batch) {
        let idle = self.idle.clone();
        let gate = self.gate.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        self.pairings.spawn(async move {
            tokio::select! {
                biased;
                maybe_inbox = idle.take() => {
                    let Some(inbox) = maybe_inbox else {
                        counter!(BRIDGE_BATCHES_DROPPED_TOTAL).increment(1);
                        warn!(records = batch.len(), "dropping batch: idle registry torn down");
                        return;
                    };

                    gate.release();

                    if inbox.send(batch).await.is_err() {
                        // The worker exited between registering and delivery;
                        // only possible once shutdown has been raised.
                        counter!(BRIDGE_BATCHES_DROPPED_TOTAL).increment(1);
                        warn!("dropping batch: assigned worker already stopped");
                    }
                }
                _ = shutdown_rx.wait_for_shutdown() => {
                    counter!(BRIDGE_BATCHES_DROPPED_TOTAL).increment(1);
                    warn!(
                        records = batch.len(),
                        "dropping batch: shutdown before a worker became idle"
                    );
                }
            }
        });
    }
}
