use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::BridgeResult;

/// Label key that overrides the metric name when present.
const NAME_LABEL: &str = "__name__";

/// A single metric sample as carried on the stream.
///
/// Records arrive as JSON objects with a name, an RFC 3339 timestamp, a
/// numeric value, and an optional label map. Labels are kept in a
/// [`BTreeMap`] so rendering is deterministic.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricRecord {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl MetricRecord {
    /// Parses a raw record payload.
    ///
    /// A `__name__` label overrides the top-level name and is removed from
    /// the label set.
    pub fn parse(raw: &str) -> BridgeResult<Self> {
        let mut record: MetricRecord = serde_json::from_str(raw)?;

        if let Some(name) = record.labels.remove(NAME_LABEL) {
            record.name = name;
        }

        Ok(record)
    }

    /// Renders the record as one `COPY ... FROM STDIN` text-format row with
    /// columns `(time, name, value, labels)`.
    ///
    /// Label data is serialized as JSON. Returns an error if the label map
    /// cannot be serialized, which cannot happen for string-to-string maps in
    /// practice.
    pub fn copy_row(&self) -> BridgeResult<String> {
        let labels = serde_json::to_string(&self.labels)?;

        Ok(format!(
            "{}\t{}\t{}\t{}",
            self.timestamp.to_rfc3339(),
            escape_copy_text(&self.name),
            self.value,
            escape_copy_text(&labels),
        ))
    }
}

/// Escapes a text value for the Postgres COPY text format.
///
/// Backslashes and the delimiter/terminator characters must be escaped so
/// they are not interpreted structurally.
fn escape_copy_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_with_labels() {
        let record = MetricRecord::parse(
            r#"{"name": "cpu_usage", "timestamp": "2019-02-15T10:00:00Z", "value": 0.5, "labels": {"host": "db-1"}}"#,
        )
        .unwrap();

        assert_eq!(record.name, "cpu_usage");
        assert_eq!(record.value, 0.5);
        assert_eq!(record.labels.get("host").map(String::as_str), Some("db-1"));
    }

    #[test]
    fn name_label_overrides_top_level_name() {
        let record = MetricRecord::parse(
            r#"{"name": "ignored", "timestamp": "2019-02-15T10:00:00Z", "value": 1, "labels": {"__name__": "cpu_usage"}}"#,
        )
        .unwrap();

        assert_eq!(record.name, "cpu_usage");
        assert!(!record.labels.contains_key("__name__"));
    }

    #[test]
    fn rejects_invalid_timestamp() {
        let result = MetricRecord::parse(
            r#"{"name": "cpu_usage", "timestamp": "yesterday", "value": 1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn copy_row_renders_tab_separated_columns() {
        let record = MetricRecord::parse(
            r#"{"name": "cpu_usage", "timestamp": "2019-02-15T10:00:00Z", "value": 0.5, "labels": {"host": "db-1"}}"#,
        )
        .unwrap();

        let row = record.copy_row().unwrap();
        let columns: Vec<&str> = row.split('\t').collect();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[1], "cpu_usage");
        assert_eq!(columns[2], "0.5");
        assert_eq!(columns[3], r#"{"host":"db-1"}"#);
    }

    #[test]
    fn copy_text_escaping_covers_structural_characters() {
        assert_eq!(escape_copy_text("plain"), "plain");
        assert_eq!(escape_copy_text("a\tb"), "a\\tb");
        assert_eq!(escape_copy_text("a\nb"), "a\\nb");
        assert_eq!(escape_copy_text("a\\b"), "a\\\\b");
    }
}
