use std::time::Duration;

use tokio::time::Instant;

/// Default timeout for condition waits.
///
/// Chosen empirically; the states tests wait for should be reached within a
/// few hundred milliseconds.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Polls `condition` until it holds.
///
/// # Panics
///
/// Panics if [`DEFAULT_WAIT_TIMEOUT`] elapses first. This is intentional
/// behavior for tests to fail fast with a clear message instead of hanging.
pub async fn wait_until<F>(description: &str, condition: F)
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + DEFAULT_WAIT_TIMEOUT;

    while !condition() {
        if Instant::now() >= deadline {
            panic!(
                "timed out after {DEFAULT_WAIT_TIMEOUT:?} waiting for: {description}. \
                 This likely indicates the expected state was never reached."
            );
        }

        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
