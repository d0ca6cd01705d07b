use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{
    DestinationConfig, DestinationConfigWithoutSecrets, LoggingConfig, SourceConfig,
    ValidationError,
};

/// Complete configuration of one extract-transform-load run.
///
/// Constructed once at process start and passed by reference to each component.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Feature service the chapters are read from.
    #[serde(default)]
    pub source: SourceConfig,
    /// Destination the normalized records are written to.
    pub destination: DestinationConfig,
    /// Logging output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Validates the complete pipeline configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.destination.validate()
    }
}

impl Config for PipelineConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// Same as [`PipelineConfig`] but without secrets.
///
/// This type implements [`Serialize`] because it does not contain secrets,
/// so it is safe to log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfigWithoutSecrets {
    pub source: SourceConfig,
    pub destination: DestinationConfigWithoutSecrets,
    pub logging: LoggingConfig,
}

impl From<PipelineConfig> for PipelineConfigWithoutSecrets {
    fn from(value: PipelineConfig) -> Self {
        PipelineConfigWithoutSecrets {
            source: value.source,
            destination: value.destination.into(),
            logging: value.logging,
        }
    }
}
