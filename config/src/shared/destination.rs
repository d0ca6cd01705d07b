use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

fn default_dataset_id() -> String {
    DestinationConfig::DEFAULT_DATASET_ID.to_string()
}

fn default_table_id() -> String {
    DestinationConfig::DEFAULT_TABLE_ID.to_string()
}

/// Configuration of the destination the chapter records are loaded into.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfig {
    /// Google BigQuery destination addressed as `<project_id>.<dataset_id>.<table_id>`.
    BigQuery {
        /// Google Cloud project identifier.
        project_id: String,
        /// BigQuery dataset identifier.
        #[serde(default = "default_dataset_id")]
        dataset_id: String,
        /// BigQuery table identifier.
        #[serde(default = "default_table_id")]
        table_id: String,
        /// Path to a service account key file.
        ///
        /// When neither this nor `service_account_key` is set, application default
        /// credentials are used.
        #[serde(default)]
        service_account_key_path: Option<String>,
        /// Inline service account key JSON. Takes precedence over the key path.
        #[serde(default)]
        service_account_key: Option<SecretString>,
    },
    /// Keeps the records in memory and discards them at exit. Useful for dry runs.
    Memory,
}

impl DestinationConfig {
    /// Default BigQuery dataset identifier.
    pub const DEFAULT_DATASET_ID: &'static str = "du_data";

    /// Default BigQuery table identifier.
    pub const DEFAULT_TABLE_ID: &'static str = "university_chapters";

    /// Returns the configuration key of the selected destination.
    pub fn kind(&self) -> &'static str {
        match self {
            DestinationConfig::BigQuery { .. } => "big_query",
            DestinationConfig::Memory => "memory",
        }
    }

    /// Validates destination configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            DestinationConfig::BigQuery {
                project_id,
                dataset_id,
                table_id,
                ..
            } => {
                if project_id.trim().is_empty() {
                    return Err(ValidationError::EmptyField(
                        "destination.big_query.project_id",
                    ));
                }
                if dataset_id.trim().is_empty() {
                    return Err(ValidationError::EmptyField(
                        "destination.big_query.dataset_id",
                    ));
                }
                if table_id.trim().is_empty() {
                    return Err(ValidationError::EmptyField("destination.big_query.table_id"));
                }

                Ok(())
            }
            DestinationConfig::Memory => Ok(()),
        }
    }
}

/// Same as [`DestinationConfig`] but without secrets, so it is safe to log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfigWithoutSecrets {
    BigQuery {
        project_id: String,
        dataset_id: String,
        table_id: String,
        service_account_key_path: Option<String>,
        /// Whether an inline service account key was supplied.
        has_inline_service_account_key: bool,
    },
    Memory,
}

impl From<DestinationConfig> for DestinationConfigWithoutSecrets {
    fn from(value: DestinationConfig) -> Self {
        match value {
            DestinationConfig::BigQuery {
                project_id,
                dataset_id,
                table_id,
                service_account_key_path,
                service_account_key,
            } => DestinationConfigWithoutSecrets::BigQuery {
                project_id,
                dataset_id,
                table_id,
                service_account_key_path,
                has_inline_service_account_key: service_account_key.is_some(),
            },
            DestinationConfig::Memory => DestinationConfigWithoutSecrets::Memory,
        }
    }
}
