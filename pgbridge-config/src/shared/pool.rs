use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Worker pool configuration.
///
/// The pool size is fixed for the lifetime of the pipeline; it is not resized
/// at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PoolConfig {
    /// Number of write workers. `0` means one worker per available CPU core.
    #[serde(default)]
    pub workers: u16,
    /// Per-attempt write deadline, in milliseconds.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    /// Maximum write attempts per batch before the batch is dropped.
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
    /// Grace period, in milliseconds, granted to a final partial batch to be
    /// picked up by a worker before shutdown is initiated.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
}

impl PoolConfig {
    /// Default per-attempt write deadline in milliseconds.
    pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 30_000;

    /// Default maximum write attempts per batch.
    pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

    /// Default drain grace period in milliseconds.
    pub const DEFAULT_DRAIN_GRACE_MS: u64 = 100;

    /// Returns the resolved worker count.
    ///
    /// A configured value of `0` resolves to the number of available CPU
    /// cores, never less than one.
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers as usize
        }
    }

    /// Returns the per-attempt write deadline as a [`Duration`].
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Returns the drain grace period as a [`Duration`].
    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }

    /// Validates pool configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.write_timeout_ms == 0 {
            return Err(ValidationError::WriteTimeoutZero);
        }

        if self.max_write_attempts == 0 {
            return Err(ValidationError::MaxWriteAttemptsZero);
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            write_timeout_ms: default_write_timeout_ms(),
            max_write_attempts: default_max_write_attempts(),
            drain_grace_ms: default_drain_grace_ms(),
        }
    }
}

fn default_write_timeout_ms() -> u64 {
    PoolConfig::DEFAULT_WRITE_TIMEOUT_MS
}

fn default_max_write_attempts() -> u32 {
    PoolConfig::DEFAULT_MAX_WRITE_ATTEMPTS
}

fn default_drain_grace_ms() -> u64 {
    PoolConfig::DEFAULT_DRAIN_GRACE_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn explicit_worker_count_is_used_verbatim() {
        let config = PoolConfig {
            workers: 4,
            ..PoolConfig::default()
        };
        assert_eq!(config.effective_workers(), 4);
    }

    #[test]
    fn zero_timeout_and_attempts_are_rejected() {
        let config = PoolConfig {
            write_timeout_ms: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::WriteTimeoutZero)
        ));

        let config = PoolConfig {
            max_write_attempts: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MaxWriteAttemptsZero)
        ));
    }
}
