//! Loads university chapters from the ArcGIS feature service into BigQuery.
//!
//! Runs exactly one extract, transform and load cycle and exits. Any failure ends the
//! process with a non-zero status once it has been logged, and buffered log lines are
//! flushed on every exit path.

use ::config::shared::PipelineConfig;
use telemetry::tracing::init_tracing;
use tracing::{error, info};

use crate::config::{load_dotenv, load_pipeline_config, log_pipeline_config};
use crate::core::run_loader;
use crate::error::LoaderResult;

mod config;
mod core;
mod error;

fn main() -> LoaderResult<()> {
    load_dotenv()?;
    let pipeline_config = load_pipeline_config()?;

    // Dropped last, after the runtime has finished, so every log line is flushed.
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"), &pipeline_config.logging)?;
    log_pipeline_config(&pipeline_config);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(pipeline_config))?;

    Ok(())
}

async fn async_main(pipeline_config: PipelineConfig) -> LoaderResult<()> {
    match run_loader(&pipeline_config).await {
        Ok(count) => {
            info!(
                count,
                destination = pipeline_config.destination.kind(),
                "loader finished"
            );
            Ok(())
        }
        Err(err) => {
            error!(category = err.category(), "{err}");
            Err(err)
        }
    }
}
