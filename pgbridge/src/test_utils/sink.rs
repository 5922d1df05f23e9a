use std::sync::{Arc, Mutex};

use crate::bridge_error;
use crate::error::{BridgeResult, ErrorKind};
use crate::sink::{Sink, WriteContext};
use crate::test_utils::notify::wait_until;
use crate::types::Batch;

/// Behavior of one scripted write invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScript {
    /// Complete successfully.
    Succeed,
    /// Return an error immediately.
    Fail,
    /// Stall until the attempt is abandoned, then report cancellation.
    Stall,
}

/// One recorded sink invocation.
#[derive(Debug, Clone)]
pub struct WriteInvocation {
    pub worker_id: usize,
    pub attempt: u32,
    pub records: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    script: Vec<WriteScript>,
    invocations: Vec<WriteInvocation>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Sink whose write outcomes follow a per-invocation script.
///
/// Invocations beyond the script succeed. Every invocation is journaled with
/// its worker id, attempt number, and records, and the sink tracks the
/// maximum number of concurrently running writes, which makes serialization
/// properties observable from tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSink {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedSink {
    /// Creates a sink on which every write succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink following the given invocation script.
    pub fn with_script(script: Vec<WriteScript>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                script,
                ..Inner::default()
            })),
        }
    }

    /// Returns the journal of all invocations so far.
    pub fn invocations(&self) -> Vec<WriteInvocation> {
        self.inner.lock().unwrap().invocations.clone()
    }

    /// Returns the number of invocations so far.
    pub fn invocation_count(&self) -> usize {
        self.inner.lock().unwrap().invocations.len()
    }

    /// Returns the maximum number of writes that ran concurrently.
    pub fn max_in_flight(&self) -> usize {
        self.inner.lock().unwrap().max_in_flight
    }

    /// Waits until at least `count` invocations have been journaled and no
    /// write is still in flight.
    pub async fn wait_for_invocations(&self, count: usize) {
        wait_until("scripted sink invocations", || {
            let inner = self.inner.lock().unwrap();
            inner.invocations.len() >= count && inner.in_flight == 0
        })
        .await;
    }
}

impl Sink for ScriptedSink {
    fn name() -> &'static str {
        "scripted"
    }

    async fn write(&self, mut ctx: WriteContext, batch: Batch) -> BridgeResult<()> {
        let step = {
            let mut inner = self.inner.lock().unwrap();

            inner.in_flight += 1;
            inner.max_in_flight = inner.max_in_flight.max(inner.in_flight);

            let index = inner.invocations.len();
            inner.invocations.push(WriteInvocation {
                worker_id: ctx.worker_id,
                attempt: ctx.attempt,
                records: batch.records().to_vec(),
            });

            inner
                .script
                .get(index)
                .copied()
                .unwrap_or(WriteScript::Succeed)
        };

        let result = match step {
            WriteScript::Succeed => Ok(()),
            WriteScript::Fail => Err(bridge_error!(
                ErrorKind::SinkQueryFailed,
                "Scripted write failure"
            )),
            WriteScript::Stall => {
                ctx.cancellation.cancelled().await;
                Err(bridge_error!(
                    ErrorKind::WriteCanceled,
                    "Scripted stall abandoned"
                ))
            }
        };

        self.inner.lock().unwrap().in_flight -= 1;

        result
    }
}
