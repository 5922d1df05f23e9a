use serde::Deserialize;

use crate::shared::{PipelineConfig, SinkConfig, TelemetryConfig, ValidationError};

/// Complete configuration for the bridge service.
///
/// Aggregates pipeline, sink, and telemetry settings. Typically loaded from
/// configuration files at startup via [`crate::load_config`].
///
/// This intentionally does not implement [`serde::Serialize`] because the
/// sink configuration may carry secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Configuration for the ingestion pipeline.
    pub pipeline: PipelineConfig,
    /// Configuration for the batch sink.
    pub sink: SinkConfig,
    /// Telemetry exposition settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl BridgeConfig {
    /// Validates the complete bridge configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()?;
        self.sink.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_deserializes_with_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"pipeline": {}, "sink": "memory"}"#).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(
            config.pipeline.batch.max_size,
            crate::shared::BatchConfig::DEFAULT_MAX_SIZE
        );
        assert_eq!(
            config.telemetry.metrics_port,
            TelemetryConfig::DEFAULT_METRICS_PORT
        );
    }
}
