pub mod batcher;
pub mod concurrency;
pub mod dispatch;
pub mod error;
pub mod macros;
pub mod metrics;
pub mod pipeline;
pub mod sink;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
