//! Broadcast shutdown signaling for pipeline workers.
//!
//! A single [`ShutdownTx`] notifies any number of [`ShutdownRx`] subscribers
//! that the pipeline should stop. The signal is terminal: once observed, a
//! receiver will keep reporting shutdown forever.

use tokio::sync::watch;

/// Transmitter side of the shutdown channel.
///
/// Cloneable; all clones refer to the same underlying signal.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<bool>);

/// Receiver side of the shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

/// Creates a new shutdown channel.
///
/// The transmitter can produce further receivers via [`ShutdownTx::subscribe`],
/// so the initial receiver may be dropped when not needed.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx(tx), ShutdownRx(rx))
}

impl ShutdownTx {
    /// Raises the shutdown signal for all subscribers.
    ///
    /// Fails if every receiver has already been dropped, which means there is
    /// nothing left to shut down.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<bool>> {
        self.0.send(true)
    }

    /// Creates a new receiver observing this shutdown signal.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

impl ShutdownRx {
    /// Returns whether shutdown has been signaled.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until shutdown is signaled.
    ///
    /// A dropped transmitter is treated as a shutdown, since no further work
    /// can be coordinated without one.
    pub async fn wait_for_shutdown(&mut self) {
        let _ = self.0.wait_for(|shutdown| *shutdown).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn all_subscribers_observe_the_signal() {
        let (tx, mut rx_a) = create_shutdown_channel();
        let mut rx_b = tx.subscribe();

        assert!(!rx_a.is_shutdown());
        assert!(!rx_b.is_shutdown());

        tx.shutdown().unwrap();

        rx_a.wait_for_shutdown().await;
        rx_b.wait_for_shutdown().await;
        assert!(rx_a.is_shutdown());
        assert!(rx_b.is_shutdown());
    }

    #[tokio::test]
    async fn dropped_transmitter_unblocks_waiters() {
        let (tx, mut rx) = create_shutdown_channel();
        drop(tx);

        // Must complete instead of waiting forever.
        rx.wait_for_shutdown().await;
    }
}
