use std::sync::Arc;

use pgbridge_config::shared::PipelineConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::bail;
use crate::batcher::RecordBatcher;
use crate::bridge_error;
use crate::concurrency::gate::AdmissionGate;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::dispatch::Dispatcher;
use crate::error::{BridgeResult, ErrorKind};
use crate::sink::Sink;
use crate::workers::pool::WritePool;
use crate::workers::registry::IdleWorkers;

/// Intake channel depth between the producer and the dispatcher.
///
/// Kept at one so the admission gate, not the channel, bounds how far the
/// producer can run ahead of worker assignment.
const INTAKE_CAPACITY: usize = 1;

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started {
        batcher: Option<RecordBatcher>,
        dispatcher: JoinHandle<()>,
        pool: WritePool,
    },
}

/// An ingestion pipeline: a dispatcher, a fixed-size write worker pool, and
/// the admission-control plumbing between them.
///
/// All shared structures are constructed by [`IngestPipeline::start`] and
/// handed to the components by ownership, so multiple pipelines can coexist
/// in one process.
#[derive(Debug)]
pub struct IngestPipeline<K> {
    config: Arc<PipelineConfig>,
    sink: K,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
}

impl<K> IngestPipeline<K>
where
    K: Sink + Clone + Send + Sync + 'static,
{
    /// Creates a pipeline in the not-started state.
    pub fn new(config: PipelineConfig, sink: K) -> Self {
        // The initial receiver is dropped; workers and the dispatcher get
        // their own receivers via `subscribe` when the pipeline starts.
        let (shutdown_tx, _) = create_shutdown_channel();

        Self {
            config: Arc::new(config),
            sink,
            state: PipelineState::NotStarted,
            shutdown_tx,
        }
    }

    /// Returns a handle to the pipeline's shutdown signal.
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Spawns the worker pool and the dispatcher.
    pub fn start(&mut self) -> BridgeResult<()> {
        if !matches!(self.state, PipelineState::NotStarted) {
            bail!(
                ErrorKind::InvalidState,
                "Pipeline already started",
                "start() must be called at most once"
            );
        }

        let workers = self.config.pool.effective_workers();
        info!(workers, sink = K::name(), "starting ingest pipeline");

        // Registry capacity equals the pool size so workers never block while
        // publishing in steady state.
        let idle = IdleWorkers::new(workers);
        let gate = AdmissionGate::new();
        let (intake_tx, intake_rx) = mpsc::channel(INTAKE_CAPACITY);

        let pool = WritePool::spawn(&self.config.pool, self.sink.clone(), &idle, &self.shutdown_tx);

        let dispatcher =
            Dispatcher::new(intake_rx, idle, gate.clone(), self.shutdown_tx.subscribe()).spawn();

        let batcher = RecordBatcher::new(
            intake_tx,
            gate,
            self.config.batch.max_size,
            self.config.pool.drain_grace(),
        );

        self.state = PipelineState::Started {
            batcher: Some(batcher),
            dispatcher,
            pool,
        };

        Ok(())
    }

    /// Hands out the producer-facing batcher.
    ///
    /// The pipeline supports a single producer, so the batcher can be taken
    /// exactly once after [`IngestPipeline::start`].
    pub fn take_batcher(&mut self) -> BridgeResult<RecordBatcher> {
        let PipelineState::Started { batcher, .. } = &mut self.state else {
            bail!(
                ErrorKind::InvalidState,
                "Pipeline was not started",
                "call start() before take_batcher()"
            );
        };

        batcher.take().ok_or_else(|| {
            bridge_error!(
                ErrorKind::InvalidState,
                "Batcher already taken",
                "the pipeline supports a single producer"
            )
        })
    }

    /// Waits for the dispatcher and every worker task to exit.
    ///
    /// The dispatcher is joined first since it may still be delivering
    /// batches into worker inboxes; once it has exited, the stop signal is
    /// raised (a no-op if the caller already did) and the workers are joined.
    /// Worker and dispatcher panics are aggregated into the returned error.
    pub async fn wait(self) -> BridgeResult<()> {
        let PipelineState::Started {
            batcher,
            dispatcher,
            pool,
        } = self.state
        else {
            info!("pipeline was not started, nothing to wait for");

            return Ok(());
        };

        // Dropping an untaken batcher closes the intake channel, letting the
        // dispatcher exit on its own once all pairings are done.
        drop(batcher);

        let mut errors = Vec::new();

        info!("waiting for dispatcher to complete");

        if let Err(join_err) = dispatcher.await
            && !join_err.is_cancelled()
        {
            errors.push(bridge_error!(
                ErrorKind::DispatcherPanic,
                "Dispatcher panicked",
                join_err
            ));
        }

        info!("waiting for write workers to complete");

        // Workers only exit on the stop signal; raising it again here is
        // harmless when shutdown was already initiated.
        let _ = self.shutdown_tx.shutdown();

        if let Err(err) = pool.wait_all().await {
            errors.push(err);
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(())
    }

    /// Raises the stop signal for every worker and the dispatcher.
    pub fn shutdown(&self) {
        info!("trying to shut down the pipeline");

        if let Err(err) = self.shutdown_tx.shutdown() {
            error!(error = %err, "failed to send shutdown signal to the pipeline");
            return;
        }

        info!("shutdown signal sent to all workers");
    }

    /// Raises the stop signal and blocks until every task has exited.
    ///
    /// Must only be called after the producer has submitted everything it
    /// intends to submit, including a flushed final partial batch; a batch
    /// enqueued after the stop signal may never be picked up.
    pub async fn shutdown_and_wait(self) -> BridgeResult<()> {
        self.shutdown();
        self.wait().await
    }
}
