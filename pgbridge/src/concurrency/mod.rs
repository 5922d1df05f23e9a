//! Concurrency primitives for coordinating the bridge pipeline.
//!
//! All coordination between the producer, the dispatcher, and the worker pool
//! goes through the bounded message-passing primitives in this module and in
//! [`crate::workers::registry`]; no shared mutable state is accessed outside
//! of them.
//!
//! - [`shutdown`] implements the broadcast stop signal observed independently
//!   by every worker and the dispatcher.
//! - [`cancellation`] implements the per-attempt cooperative cancellation
//!   signal handed to sinks through their write context.
//! - [`gate`] implements admission control: the counting semaphore that
//!   couples the producer's ingestion rate to the pool's assignment rate.

pub mod cancellation;
pub mod gate;
pub mod shutdown;
