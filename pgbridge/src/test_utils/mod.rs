//! Helpers for exercising pipelines in tests.

mod notify;
mod sink;

pub use notify::{DEFAULT_WAIT_TIMEOUT, wait_until};
pub use sink::{ScriptedSink, WriteInvocation, WriteScript};
