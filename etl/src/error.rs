//! Error types and result definitions for ETL operations.
//!
//! [`EtlError`] carries a classification ([`ErrorKind`]), a static description, optional
//! dynamic detail, the originating error and the capture site. Several errors can be
//! aggregated into one, which is how per-row insert failures are reported.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use gcp_bigquery_client::error::BQError;

/// Convenient result type for ETL operations using [`EtlError`] as the error type.
pub type EtlResult<T> = Result<T, EtlError>;

/// Detailed payload stored for single [`EtlError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for ETL operations.
#[derive(Debug, Clone)]
pub struct EtlError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Single error payload holding rich metadata.
    Single(ErrorPayload),
    /// Multiple aggregated errors, e.g. one per rejected row.
    Many {
        errors: Vec<EtlError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors that can occur while extracting, transforming or loading chapters.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Source network errors
    SourceConnectionFailed,
    SourceTimeout,
    SourceQueryFailed,
    SourceIoError,

    // Data & transformation errors
    ConversionError,
    InvalidData,

    // Configuration errors
    ConfigError,

    // Serialization errors
    SerializationError,
    DeserializationError,

    // Destination errors
    AuthenticationError,
    DestinationIoError,
    DestinationQueryFailed,
    DestinationError,

    // Unknown / uncategorized
    Unknown,
}

impl ErrorKind {
    /// Returns `true` for failures talking to the feature service: unreachable host,
    /// timeout, non-success status or an unreadable response.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            ErrorKind::SourceConnectionFailed
                | ErrorKind::SourceTimeout
                | ErrorKind::SourceQueryFailed
                | ErrorKind::SourceIoError
        )
    }

    /// Returns `true` for failures raised by the warehouse.
    pub fn is_warehouse_failure(&self) -> bool {
        matches!(
            self,
            ErrorKind::AuthenticationError
                | ErrorKind::DestinationIoError
                | ErrorKind::DestinationQueryFailed
                | ErrorKind::DestinationError
                | ErrorKind::SerializationError
        )
    }
}

impl EtlError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattening aggregates.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the static description of this error.
    ///
    /// For multiple errors, returns the description of the first one.
    pub fn description(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.description.as_ref()),
            ErrorRepr::Many { ref errors, .. } => errors.first().and_then(|e| e.description()),
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For multiple errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the aggregated errors, or an empty slice for a single error.
    pub fn errors(&self) -> &[EtlError] {
        match self.repr {
            ErrorRepr::Single(_) => &[],
            ErrorRepr::Many { ref errors, .. } => errors,
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

    /// Returns `true` if this error comes from the feature service.
    pub fn is_network_failure(&self) -> bool {
        self.kind().is_network_failure()
    }

    /// Returns `true` if this error comes from the warehouse.
    pub fn is_warehouse_failure(&self) -> bool {
        self.kind().is_warehouse_failure()
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors, which forward their first error as the source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    /// Replaces the dynamic detail of this error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors.
    pub fn with_detail<D>(mut self, detail: D) -> Self
    where
        D: Into<Cow<'static, str>>,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.detail = Some(detail.into());
        }
        self
    }

    /// Creates an [`EtlError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        EtlError {
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

impl PartialEq for EtlError {
    fn eq(&self, other: &EtlError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (
                ErrorRepr::Many {
                    errors: errors_a, ..
                },
                ErrorRepr::Many {
                    errors: errors_b, ..
                },
            ) => errors_a == errors_b,
            _ => false,
        }
    }
}

impl fmt::Display for EtlError {
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

                write_detail(payload.detail.as_deref(), f)?;
                write_backtrace(payload.backtrace.as_ref(), f)
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

                if errors.is_empty() {
                    return write!(f, "\n  (no inner errors provided)");
                }

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    match lines.next() {
                        Some(first_line) => write!(f, "\n  {}. {}", index + 1, first_line)?,
                        None => write!(f, "\n  {}.", index + 1)?,
                    }

                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for EtlError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Writes the captured backtrace, if one was captured.
fn write_backtrace(backtrace: &Backtrace, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered = backtrace.to_string();
    if rendered.trim().is_empty() || rendered.contains("disabled backtrace") {
        return Ok(());
    }

    write!(f, "\n  Backtrace:")?;
    for line in rendered.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

/// Writes the indented detail block.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    if detail.trim().is_empty() {
        return write!(f, "\n  Detail: <empty>");
    }

    write!(f, "\n  Detail:")?;
    for line in detail.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

/// Creates an [`EtlError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for EtlError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates an [`EtlError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for EtlError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates a vector of errors.
///
/// A vector holding exactly one error yields that error unwrapped.
impl<E> From<Vec<E>> for EtlError
where
    E: Into<EtlError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> EtlError {
        let location = Location::caller();

        let mut errors: Vec<EtlError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1
            && let Some(error) = errors.pop()
        {
            return error;
        }

        EtlError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`serde_json::Error`] to [`EtlError`].
///
/// Maps to [`ErrorKind::SerializationError`] or [`ErrorKind::DeserializationError`]
/// depending on the error classification.
impl From<serde_json::Error> for EtlError {
    #[track_caller]
    fn from(err: serde_json::Error) -> EtlError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => {
                (ErrorKind::SerializationError, "JSON serialization failed")
            }
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`std::num::ParseFloatError`] to [`EtlError`] with [`ErrorKind::ConversionError`].
impl From<std::num::ParseFloatError> for EtlError {
    #[track_caller]
    fn from(err: std::num::ParseFloatError) -> EtlError {
        let detail = err.to_string();
        EtlError::from_components(
            ErrorKind::ConversionError,
            Cow::Borrowed("Coordinate is not a number"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`reqwest::Error`] raised while querying the feature service.
///
/// Every variant maps to a network failure kind: timeouts, connection failures,
/// non-success statuses and unreadable bodies are told apart for diagnostics only.
impl From<reqwest::Error> for EtlError {
    #[track_caller]
    fn from(err: reqwest::Error) -> EtlError {
        let (kind, description) = if err.is_timeout() {
            (ErrorKind::SourceTimeout, "Feature service request timed out")
        } else if err.is_connect() {
            (
                ErrorKind::SourceConnectionFailed,
                "Feature service connection failed",
            )
        } else if err.is_status() {
            (
                ErrorKind::SourceQueryFailed,
                "Feature service returned a non-success status",
            )
        } else if err.is_decode() {
            (
                ErrorKind::SourceIoError,
                "Feature service response could not be decoded",
            )
        } else {
            (ErrorKind::SourceIoError, "Feature service request failed")
        };

        let detail = err.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`BQError`] to [`EtlError`] with a destination error kind.
impl From<BQError> for EtlError {
    #[track_caller]
    fn from(err: BQError) -> EtlError {
        let (kind, description) = match &err {
            BQError::InvalidServiceAccountKey(_) => (
                ErrorKind::AuthenticationError,
                "Invalid BigQuery service account key",
            ),
            BQError::InvalidServiceAccountAuthenticator(_) => (
                ErrorKind::AuthenticationError,
                "Invalid BigQuery service account authenticator",
            ),
            BQError::InvalidApplicationDefaultCredentialsAuthenticator(_) => (
                ErrorKind::AuthenticationError,
                "Invalid BigQuery application default credentials",
            ),
            BQError::AuthError(_) => (
                ErrorKind::AuthenticationError,
                "BigQuery authentication error",
            ),
            BQError::YupAuthError(_) => (
                ErrorKind::AuthenticationError,
                "BigQuery OAuth authentication error",
            ),
            BQError::NoToken => (
                ErrorKind::AuthenticationError,
                "BigQuery authentication token missing",
            ),
            BQError::RequestError(_) => (ErrorKind::DestinationIoError, "BigQuery request failed"),
            BQError::ResponseError { .. } => {
                (ErrorKind::DestinationQueryFailed, "BigQuery response error")
            }
            BQError::SerializationError(_) => (
                ErrorKind::SerializationError,
                "BigQuery JSON serialization error",
            ),
            _ => (ErrorKind::DestinationError, "BigQuery client error"),
        };

        let detail = err.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
