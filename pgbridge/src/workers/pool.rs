use pgbridge_config::shared::PoolConfig;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::bridge_error;
use crate::concurrency::shutdown::ShutdownTx;
use crate::error::{BridgeResult, ErrorKind};
use crate::sink::Sink;
use crate::workers::registry::IdleWorkers;
use crate::workers::write::WriteWorker;

/// The fixed-size set of write workers.
///
/// [`WritePool`] owns every spawned worker task. The pool is sized once at
/// startup and never resized; workers run until they observe the stop signal.
#[derive(Debug)]
pub struct WritePool {
    join_set: JoinSet<usize>,
    worker_count: usize,
}

impl WritePool {
    /// Spawns the configured number of workers, each subscribed to the
    /// shutdown signal and sharing the idle registry.
    pub fn spawn<K>(
        config: &PoolConfig,
        sink: K,
        idle: &IdleWorkers,
        shutdown_tx: &ShutdownTx,
    ) -> Self
    where
        K: Sink + Clone + Send + Sync + 'static,
    {
        let worker_count = config.effective_workers();
        let mut join_set = JoinSet::new();

        for id in 1..=worker_count {
            let worker = WriteWorker::new(
                id,
                sink.clone(),
                idle.clone(),
                config.write_timeout(),
                config.max_write_attempts,
                shutdown_tx.subscribe(),
            );
            join_set.spawn(worker.run());

            info!(worker_id = id, "running write worker");
        }

        Self {
            join_set,
            worker_count,
        }
    }

    /// Returns the number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Waits for every worker task to exit.
    ///
    /// Worker panics are collected and returned as an aggregated error; a
    /// worker completing normally never carries an error, since write
    /// failures stay inside the attempt loop.
    pub async fn wait_all(mut self) -> BridgeResult<()> {
        let mut errors = Vec::new();

        while let Some(result) = self.join_set.join_next().await {
            match result {
                Ok(worker_id) => {
                    debug!(worker_id, "write worker exited");
                }
                Err(join_err) => {
                    if join_err.is_cancelled() {
                        debug!("write worker task was cancelled");
                    } else {
                        errors.push(bridge_error!(
                            ErrorKind::WorkerPanic,
                            "Write worker panicked",
                            join_err
                        ));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}
