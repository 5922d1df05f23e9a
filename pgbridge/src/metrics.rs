//! Metrics definitions for bridge monitoring.

/// Label for worker ID in metrics.
pub const WORKER_ID_LABEL: &str = "worker_id";

/// Label for the reason of a write failure (`error` or `timeout`).
pub const REASON_LABEL: &str = "reason";

// Ingestion metrics

/// Counter for total records received from the stream.
pub const BRIDGE_RECORDS_RECEIVED_TOTAL: &str = "bridge_records_received_total";

/// Counter for total batches submitted for dispatch.
pub const BRIDGE_BATCHES_SUBMITTED_TOTAL: &str = "bridge_batches_submitted_total";

// Delivery metrics

/// Counter for total batches delivered to the sink.
pub const BRIDGE_BATCHES_DELIVERED_TOTAL: &str = "bridge_batches_delivered_total";

/// Counter for failed write attempts.
pub const BRIDGE_WRITE_FAILURES_TOTAL: &str = "bridge_write_failures_total";

/// Counter for batches dropped after exhausting all write attempts.
///
/// Dropped data is never retried; this counter is the operator-visible signal
/// of that loss.
pub const BRIDGE_BATCHES_DROPPED_TOTAL: &str = "bridge_batches_dropped_total";

/// Histogram for the duration of successful sink writes.
pub const BRIDGE_WRITE_DURATION_SECONDS: &str = "bridge_write_duration_seconds";

// Postgres sink metrics

/// Counter for records written to Postgres.
pub const BRIDGE_RECORDS_WRITTEN_TOTAL: &str = "bridge_records_written_total";

/// Counter for records skipped because their payload could not be parsed.
pub const BRIDGE_RECORDS_SKIPPED_TOTAL: &str = "bridge_records_skipped_total";
