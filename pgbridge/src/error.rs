//! Error types and result definitions for bridge operations.
//!
//! Provides an error system with classification, aggregation, and captured
//! diagnostic metadata. The [`BridgeError`] type supports single errors,
//! errors with additional detail, and multiple aggregated errors for cases
//! such as several workers failing at shutdown.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for bridge operations using [`BridgeError`] as the
/// error type.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Detailed payload stored for single [`BridgeError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for bridge operations.
///
/// [`BridgeError`] can represent a single classified error, optionally with
/// dynamic detail and a source, or multiple aggregated errors.
#[derive(Debug, Clone)]
pub struct BridgeError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Single error payload holding rich metadata.
    Single(ErrorPayload),
    /// Multiple aggregated errors.
    ///
    /// This variant is mainly useful to capture multiple worker failures.
    Many {
        errors: Vec<BridgeError>,
        location: &'static Location<'static>,
    },
}

/// Specific categories of errors that can occur during bridge operations.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Sink errors
    SinkQueryFailed,
    SinkPanic,
    WriteCanceled,

    // IO & serialization errors
    IoError,
    SerializationError,
    DeserializationError,

    // State & workflow errors
    InvalidState,
    WorkerPanic,
    DispatcherPanic,

    // Unknown / uncategorized
    Unknown,
}

impl BridgeError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or
    /// [`ErrorKind::Unknown`] if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For aggregated errors, returns the detail of the first error that has
    /// one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating [`error::Error`] to this error and returns the
    /// modified instance.
    ///
    /// Has no effect when called on aggregated errors because aggregates
    /// forward the first contained error as their source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    /// Creates a [`BridgeError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        BridgeError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for BridgeError {
    fn eq(&self, other: &BridgeError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (
                ErrorRepr::Many {
                    errors: errors_a, ..
                },
                ErrorRepr::Many {
                    errors: errors_b, ..
                },
            ) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail: {detail}")?;
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = format!("{error}");
                    for (line_index, line) in rendered.lines().enumerate() {
                        if line_index == 0 {
                            write!(f, "\n  {}. {}", index + 1, line)?;
                        } else {
                            write!(f, "\n     {line}")?;
                        }
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            // For aggregated errors, forward the first contained error.
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`BridgeError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for BridgeError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> BridgeError {
        BridgeError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`BridgeError`] from an error kind, static description, and
/// dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for BridgeError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> BridgeError {
        BridgeError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Creates a [`BridgeError`] from a vector of errors for aggregation.
///
/// If the vector contains exactly one error, returns that error directly
/// without wrapping it.
impl<E> From<Vec<E>> for BridgeError
where
    E: Into<BridgeError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> BridgeError {
        let location = Location::caller();

        let mut errors: Vec<BridgeError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            return errors.pop().expect("just checked length is 1");
        }

        BridgeError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`BridgeError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for BridgeError {
    #[track_caller]
    fn from(err: std::io::Error) -> BridgeError {
        let detail = err.to_string();
        BridgeError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`BridgeError`] with the appropriate
/// error kind based on error classification.
impl From<serde_json::Error> for BridgeError {
    #[track_caller]
    fn from(err: serde_json::Error) -> BridgeError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        BridgeError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`sqlx::Error`] to [`BridgeError`] with
/// [`ErrorKind::SinkQueryFailed`].
impl From<sqlx::Error> for BridgeError {
    #[track_caller]
    fn from(err: sqlx::Error) -> BridgeError {
        let detail = err.to_string();
        BridgeError::from_components(
            ErrorKind::SinkQueryFailed,
            Cow::Borrowed("Postgres sink operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge_error;

    #[test]
    fn single_error_exposes_kind_and_detail() {
        let err = bridge_error!(
            ErrorKind::InvalidState,
            "Pipeline not started",
            "start() must be called first"
        );

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.detail(), Some("start() must be called first"));
    }

    #[test]
    fn aggregation_of_one_error_unwraps() {
        let err: BridgeError = vec![bridge_error!(ErrorKind::WorkerPanic, "Worker panicked")].into();
        assert_eq!(err.kind(), ErrorKind::WorkerPanic);
        assert_eq!(err.kinds().len(), 1);
    }

    #[test]
    fn aggregation_collects_all_kinds() {
        let err: BridgeError = vec![
            bridge_error!(ErrorKind::WorkerPanic, "Worker panicked"),
            bridge_error!(ErrorKind::DispatcherPanic, "Dispatcher panicked"),
        ]
        .into();

        assert_eq!(err.kind(), ErrorKind::WorkerPanic);
        assert_eq!(
            err.kinds(),
            vec![ErrorKind::WorkerPanic, ErrorKind::DispatcherPanic]
        );
    }

    #[test]
    fn json_errors_map_to_deserialization_kind() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: BridgeError = err.into();
        assert_eq!(err.kind(), ErrorKind::DeserializationError);
    }
}
