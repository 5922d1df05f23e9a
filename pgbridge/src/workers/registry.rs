use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::types::Batch;

/// Sender half of a worker's private inbox.
pub type WorkerInbox = mpsc::Sender<Batch>;

/// Bounded FIFO through which idle workers advertise availability.
///
/// Capacity equals the pool size, so a worker that only publishes when it is
/// not already published never blocks in steady state. Workers publish their
/// inbox sender between batches; dispatcher pairing tasks take one to find a
/// free worker, suspending while none is idle.
#[derive(Debug, Clone)]
pub struct IdleWorkers {
    tx: mpsc::Sender<WorkerInbox>,
    rx: Arc<Mutex<mpsc::Receiver<WorkerInbox>>>,
}

impl IdleWorkers {
    /// Creates a registry with room for `capacity` idle workers.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);

        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Publishes a worker's inbox as idle.
    ///
    /// Suspends while the registry is at capacity. Returns `false` if the
    /// registry has been torn down.
    pub async fn publish(&self, inbox: WorkerInbox) -> bool {
        self.tx.send(inbox).await.is_ok()
    }

    /// Takes the longest-idle worker's inbox, suspending while none is idle.
    ///
    /// Returns `None` only once the registry has been torn down and drained.
    pub async fn take(&self) -> Option<WorkerInbox> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn take_returns_workers_in_publish_order() {
        let registry = IdleWorkers::new(2);
        let (first_tx, _first_rx) = mpsc::channel::<Batch>(1);
        let (second_tx, _second_rx) = mpsc::channel::<Batch>(1);

        assert!(registry.publish(first_tx.clone()).await);
        assert!(registry.publish(second_tx.clone()).await);

        let taken = registry.take().await.unwrap();
        assert!(taken.same_channel(&first_tx));
        let taken = registry.take().await.unwrap();
        assert!(taken.same_channel(&second_tx));
    }

    #[tokio::test]
    async fn publish_suspends_when_registry_is_full() {
        let registry = IdleWorkers::new(1);
        let (inbox_tx, _inbox_rx) = mpsc::channel::<Batch>(1);

        assert!(registry.publish(inbox_tx.clone()).await);

        let overflow = tokio::time::timeout(
            Duration::from_millis(20),
            registry.publish(inbox_tx.clone()),
        )
        .await;
        assert!(overflow.is_err(), "publish past capacity must suspend");
    }

    #[tokio::test]
    async fn take_suspends_while_no_worker_is_idle() {
        let registry = IdleWorkers::new(1);

        let taken = tokio::time::timeout(Duration::from_millis(20), registry.take()).await;
        assert!(taken.is_err(), "take must suspend on an empty registry");
    }
}
