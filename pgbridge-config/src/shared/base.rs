use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Maximum write attempts per batch cannot be zero.
    #[error("`pool.max_write_attempts` cannot be zero")]
    MaxWriteAttemptsZero,
    /// Per-attempt write timeout cannot be zero.
    #[error("`pool.write_timeout_ms` cannot be zero")]
    WriteTimeoutZero,
    /// A field holds a value outside its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue {
        field: &'static str,
        constraint: &'static str,
    },
}
