use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Batch accumulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Number of records accumulated before a batch is submitted for dispatch.
    #[serde(default = "default_batch_max_size")]
    pub max_size: usize,
}

impl BatchConfig {
    /// Default maximum batch size.
    pub const DEFAULT_MAX_SIZE: usize = 10_000;

    /// Validates batch configuration settings.
    ///
    /// Ensures `max_size` is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "batch.max_size",
                constraint: "must be greater than 0",
            });
        }

        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: default_batch_max_size(),
        }
    }
}

fn default_batch_max_size() -> usize {
    BatchConfig::DEFAULT_MAX_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = BatchConfig::default();
        assert_eq!(config.max_size, BatchConfig::DEFAULT_MAX_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_max_size_is_rejected() {
        let config = BatchConfig { max_size: 0 };
        assert!(config.validate().is_err());
    }
}
