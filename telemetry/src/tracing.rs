//! Tracing subscriber initialization.
//!
//! Log lines are written through a non-blocking stdout writer. The [`LogFlusher`] guard
//! returned by [`init_tracing`] must be kept alive for the whole run: dropping it flushes
//! the buffered lines, which is what guarantees that logs survive an error exit.

use std::io;
use std::sync::Once;

use config::shared::LoggingConfig;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Filter directive used when `RUST_LOG` is not set.
const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Environment variable that turns on log output in tests.
const ENABLE_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to bridge `log` records into tracing: {0}")]
    LogTracer(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to install the global tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Flushes buffered log lines when dropped.
#[must_use = "dropping the flusher right away discards buffered log lines"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global tracing subscriber for `app_name`.
///
/// Uses `RUST_LOG` as the filter, defaulting to `info`. When
/// [`LoggingConfig::cloud_logging`] is set, events are emitted as flattened JSON objects,
/// one per line, which Cloud Logging parses into structured entries (including an
/// explicit `severity` field when an event carries one). Records emitted through the
/// `log` crate by dependencies are forwarded into tracing.
pub fn init_tracing(app_name: &str, config: &LoggingConfig) -> Result<LogFlusher, TracingError> {
    tracing_log::LogTracer::init()?;

    let (writer, guard) = tracing_appender::non_blocking(io::stdout());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

    if config.cloud_logging {
        let layer = fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(writer);

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()?;
    } else {
        let layer = fmt::layer().with_target(true).with_writer(writer);

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()?;
    }

    ::tracing::info!(
        app = app_name,
        cloud_logging = config.cloud_logging,
        "logging configured"
    );

    Ok(LogFlusher { _guard: guard })
}

/// Installs a test subscriber once per process when `ENABLE_TRACING` is set.
///
/// Output goes through the test writer so that it is captured per test.
pub fn init_test_tracing() {
    if std::env::var(ENABLE_TRACING_ENV_NAME).is_err() {
        return;
    }

    INIT_TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
