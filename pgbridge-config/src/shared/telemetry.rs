use serde::{Deserialize, Serialize};

/// Telemetry exposition configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TelemetryConfig {
    /// Port on which Prometheus metrics are served at `/metrics`.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

impl TelemetryConfig {
    /// Default metrics exposition port.
    pub const DEFAULT_METRICS_PORT: u16 = 9528;
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    TelemetryConfig::DEFAULT_METRICS_PORT
}
