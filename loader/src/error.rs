use config::LoadConfigError;
use config::shared::ValidationError;
use etl::error::EtlError;
use telemetry::tracing::TracingError;
use thiserror::Error;

/// Result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Error type for the loader binary.
///
/// Wraps [`EtlError`] for failures of the run itself and provides variants for process
/// setup failures.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Extraction, normalization or load failure.
    #[error(transparent)]
    Etl(#[from] EtlError),

    /// The `.env` file exists but could not be read.
    #[error("failed to load the .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] LoadConfigError),

    /// The configuration was loaded but is invalid.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// Logging could not be initialized.
    #[error("failed to initialize logging: {0}")]
    Tracing(#[from] TracingError),

    /// The async runtime could not be built.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoaderError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            LoaderError::Etl(err) if err.is_network_failure() => "network failure",
            LoaderError::Etl(err) if err.is_warehouse_failure() => "warehouse failure",
            LoaderError::Etl(_) => "etl error",
            LoaderError::Dotenv(_) | LoaderError::Config(_) | LoaderError::Validation(_) => {
                "configuration error"
            }
            LoaderError::Tracing(_) => "logging error",
            LoaderError::Io(_) => "i/o error",
        }
    }
}
