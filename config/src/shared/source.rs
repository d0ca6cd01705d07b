use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration of the feature service the chapters are extracted from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Query endpoint of the feature service layer.
    #[serde(default = "default_url")]
    pub url: String,
    /// Number of features requested per page (`resultRecordCount`).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Timeout, in milliseconds, applied to each individual page request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SourceConfig {
    /// Public ArcGIS query endpoint of the university chapters layer.
    pub const DEFAULT_URL: &'static str = "https://services2.arcgis.com/5I7u4SJE1vUr79JC/arcgis/rest/services/UniversityChapters_Public/FeatureServer/0/query";

    /// Default number of features per page.
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    /// Default per-request timeout in milliseconds.
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

    /// Validates source configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::EmptyField("source.url"));
        }

        if self.page_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.page_size".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.request_timeout_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.request_timeout_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            page_size: default_page_size(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_url() -> String {
    SourceConfig::DEFAULT_URL.to_string()
}

const fn default_page_size() -> u32 {
    SourceConfig::DEFAULT_PAGE_SIZE
}

const fn default_request_timeout_ms() -> u64 {
    SourceConfig::DEFAULT_REQUEST_TIMEOUT_MS
}
