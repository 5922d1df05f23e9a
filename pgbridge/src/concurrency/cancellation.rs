//! Cooperative cancellation for individual write attempts.
//!
//! Every write attempt gets its own cancellation pair. When the attempt's
//! deadline elapses, the worker raises the signal and moves on; the in-flight
//! write task is not preempted and must observe the signal itself to abandon
//! work early.

use tokio::sync::watch;

/// Transmitter side of an attempt's cancellation signal.
#[derive(Debug)]
pub struct CancellationTx(watch::Sender<bool>);

/// Receiver side of an attempt's cancellation signal.
#[derive(Debug, Clone)]
pub struct CancellationRx(watch::Receiver<bool>);

/// Creates a new cancellation pair for a single write attempt.
pub fn create_cancellation() -> (CancellationTx, CancellationRx) {
    let (tx, rx) = watch::channel(false);
    (CancellationTx(tx), CancellationRx(rx))
}

impl CancellationTx {
    /// Signals that the attempt has been abandoned.
    pub fn cancel(self) {
        // Receivers may already be gone if the write completed concurrently.
        let _ = self.0.send(true);
    }
}

impl CancellationRx {
    /// Returns whether the attempt has been abandoned.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until the attempt is abandoned.
    ///
    /// A dropped transmitter means the attempt concluded without
    /// cancellation; this future then stays pending, so callers should only
    /// use it inside a `select!` against the actual work.
    pub async fn cancelled(&mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            // Transmitter dropped without cancelling: never resolve.
            std::future::pending::<()>().await;
        }
    }
}
