use std::error::Error;

use pgbridge::error::BridgeError;
use thiserror::Error as ThisError;

/// Result type for bridge service operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type for the bridge service.
///
/// Wraps [`BridgeError`] for pipeline errors and provides variants for
/// infrastructure failures around it.
#[derive(Debug, ThisError)]
pub enum IngestError {
    /// Pipeline or sink error.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// Configuration or telemetry initialization error.
    #[error("configuration error: {0}")]
    Config(#[source] Box<dyn Error + Send + Sync>),
    /// I/O error on the record stream.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Creates a configuration error from any boxed source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        IngestError::Config(Box::new(err))
    }
}
