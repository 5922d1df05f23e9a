//! Admission control between the producer and the worker pool.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::bail;
use crate::error::{BridgeResult, ErrorKind};

/// Counting semaphore that throttles the producer based on the pool's
/// assignment rate.
///
/// The gate starts with zero tokens. The dispatcher releases one token each
/// time a batch is paired with a worker; the producer acquires one token
/// after each batch it submits, before accepting further input. This bounds
/// how far the producer can run ahead of worker assignment without tying it
/// to write completion, so the producer can stay ahead of in-flight writes,
/// bounded only by the number of workers.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
}

impl AdmissionGate {
    /// Creates a new gate with zero available tokens.
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    /// Releases one admission token.
    ///
    /// Called once per successful dispatcher-to-worker pairing.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    /// Acquires one admission token, suspending until one is available.
    pub async fn acquire(&self) -> BridgeResult<()> {
        match self.permits.acquire().await {
            Ok(permit) => {
                permit.forget();
                Ok(())
            }
            Err(_) => bail!(
                ErrorKind::InvalidState,
                "Admission gate closed",
                "the worker pool is no longer assigning batches"
            ),
        }
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn acquire_suspends_until_release() {
        let gate = AdmissionGate::new();

        let waited = tokio::time::timeout(Duration::from_millis(20), gate.acquire()).await;
        assert!(waited.is_err(), "acquire must suspend with no tokens");

        gate.release();
        gate.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn tokens_are_consumed_once() {
        let gate = AdmissionGate::new();
        gate.release();
        gate.acquire().await.unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(20), gate.acquire()).await;
        assert!(waited.is_err(), "a token must not be reusable");
    }
}
