use std::future::Future;

use crate::concurrency::cancellation::CancellationRx;
use crate::error::BridgeResult;
use crate::types::Batch;

/// Context handed to a sink for one write attempt.
///
/// Carries the identity of the attempt and the cancellation signal the sink
/// must observe: when the attempt's deadline elapses the worker raises the
/// signal and moves on, but the write task itself is not preempted. A sink
/// that ignores the signal may keep running in the background while the
/// worker already retries, so implementations must not rely on attempts being
/// serialized against each other.
#[derive(Debug)]
pub struct WriteContext {
    /// Identity of the worker performing the attempt.
    pub worker_id: usize,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// Raised when the attempt has been abandoned.
    pub cancellation: CancellationRx,
}

impl WriteContext {
    /// Creates a context for a single write attempt.
    pub fn new(worker_id: usize, attempt: u32, cancellation: CancellationRx) -> Self {
        Self {
            worker_id,
            attempt,
            cancellation,
        }
    }
}

/// Trait for systems that can durably store delivered batches.
///
/// [`Sink`] implementations define how a batch's records are written to the
/// target system. `write` may be invoked several times for the same batch
/// (once per attempt) and concurrently across different workers; calls must
/// not share transactional state. Because a timed-out attempt may still be
/// running when the next one starts, implementations must be safe under that
/// overlap.
pub trait Sink {
    /// Returns the name of the sink.
    fn name() -> &'static str;

    /// Writes one batch to the sink.
    ///
    /// Implementations should complete or abort before the attempt deadline
    /// whenever possible by observing [`WriteContext::cancellation`].
    fn write(&self, ctx: WriteContext, batch: Batch)
    -> impl Future<Output = BridgeResult<()>> + Send;
}
