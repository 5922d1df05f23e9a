use serde::{Deserialize, Serialize};

use crate::shared::{BatchConfig, PoolConfig, ValidationError};

/// Configuration for an ingestion pipeline.
///
/// Contains everything the core pipeline needs: batch accumulation settings
/// and worker pool sizing, timeouts, and retry limits. The pipeline does not
/// renegotiate any of these at runtime.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Batch accumulation configuration.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Worker pool configuration.
    #[serde(default)]
    pub pool: PoolConfig,
}

impl PipelineConfig {
    /// Validates pipeline configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.batch.validate()?;
        self.pool.validate()?;

        Ok(())
    }
}
