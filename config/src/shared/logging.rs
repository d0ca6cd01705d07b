use serde::{Deserialize, Serialize};

/// Logging output configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Emits flattened JSON log lines on stdout so that Google Cloud Logging can ingest
    /// them as structured entries. Human-readable output is used when `false`.
    #[serde(default)]
    pub cloud_logging: bool,
}
