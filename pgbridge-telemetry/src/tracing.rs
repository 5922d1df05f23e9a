use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::util::TryInitError;

/// Errors that can occur while initializing tracing.
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber was already installed.
    #[error("failed to initialize tracing: {0}")]
    Init(#[from] TryInitError),
}

/// Initializes the global tracing subscriber.
///
/// The filter is taken from `RUST_LOG` when set and defaults to `info`
/// otherwise. Must be called at most once per process.
pub fn init_tracing(service_name: &str) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .finish()
        .try_init()?;

    info!(service_name, "tracing initialized");

    Ok(())
}
