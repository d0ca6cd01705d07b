use config::load_config;
use config::shared::{PipelineConfig, PipelineConfigWithoutSecrets};
use tracing::info;

use crate::error::LoaderResult;

/// Loads the `.env` file when one is present.
///
/// Only a missing file is tolerated; a file that exists but cannot be parsed is an error.
pub fn load_dotenv() -> LoaderResult<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Loads and validates the pipeline configuration.
pub fn load_pipeline_config() -> LoaderResult<PipelineConfig> {
    let config = load_config::<PipelineConfig>()?;
    config.validate()?;

    Ok(config)
}

/// Logs the effective configuration with secrets stripped.
pub fn log_pipeline_config(config: &PipelineConfig) {
    let config = PipelineConfigWithoutSecrets::from(config.clone());

    info!(?config, "configuration loaded");
}
