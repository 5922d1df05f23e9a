use serde::Deserialize;

use crate::shared::{PgConnectionConfig, ValidationError};

/// Configuration for supported batch sinks.
///
/// Specifies the sink type and its associated settings. This intentionally
/// does not implement [`serde::Serialize`] because the Postgres variant
/// carries connection secrets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkConfig {
    /// In-memory sink; batches are kept in process memory. Useful for
    /// development and testing.
    Memory,
    /// Postgres sink; each batch is loaded in a single transaction via COPY.
    Postgres {
        /// Connection settings for the target database.
        connection: PgConnectionConfig,
        /// Target table. Must exist with columns `(time, name, value, labels)`.
        table: String,
    },
}

impl SinkConfig {
    /// Validates sink configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let SinkConfig::Postgres { table, .. } = self
            && table.is_empty()
        {
            return Err(ValidationError::InvalidFieldValue {
                field: "sink.postgres.table",
                constraint: "must not be empty",
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_deserializes_from_unit_variant() {
        let config: SinkConfig = serde_json::from_str(r#""memory""#).unwrap();
        assert!(matches!(config, SinkConfig::Memory));
    }

    #[test]
    fn postgres_sink_requires_table_name() {
        let config: SinkConfig = serde_json::from_str(
            r#"{"postgres": {"connection": {"host": "localhost", "port": 5432, "name": "metrics", "username": "bridge", "password": null}, "table": ""}}"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
