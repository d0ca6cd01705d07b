use config::shared::{DestinationConfig, PipelineConfig};
use etl::destination::Destination;
use etl::destination::bigquery::BigQueryDestination;
use etl::destination::memory::MemoryDestination;
use etl::encryption::install_crypto_provider;
use etl::pipeline::Pipeline;
use etl::source::{FeatureServiceSource, Source};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::error::LoaderResult;

/// Builds the source and the configured destination, then runs one cycle.
///
/// Returns the number of loaded records.
pub async fn run_loader(config: &PipelineConfig) -> LoaderResult<usize> {
    let source = FeatureServiceSource::new(&config.source)?;

    // Static dispatch per destination.
    match &config.destination {
        DestinationConfig::Memory => {
            warn!("memory destination selected, records are discarded at exit");

            let destination = MemoryDestination::new();

            run_pipeline(source, destination).await
        }
        DestinationConfig::BigQuery {
            project_id,
            dataset_id,
            table_id,
            service_account_key_path,
            service_account_key,
        } => {
            install_crypto_provider();

            let destination = match (service_account_key, service_account_key_path) {
                (Some(sa_key), _) => {
                    BigQueryDestination::new_with_key(
                        project_id.clone(),
                        dataset_id.clone(),
                        table_id.clone(),
                        sa_key.expose_secret(),
                    )
                    .await?
                }
                (None, Some(sa_key_path)) => {
                    BigQueryDestination::new_with_key_path(
                        project_id.clone(),
                        dataset_id.clone(),
                        table_id.clone(),
                        sa_key_path,
                    )
                    .await?
                }
                (None, None) => {
                    info!(
                        "no service account key configured, using application default credentials"
                    );

                    BigQueryDestination::new_with_adc(
                        project_id.clone(),
                        dataset_id.clone(),
                        table_id.clone(),
                    )
                    .await?
                }
            };

            run_pipeline(source, destination).await
        }
    }
}

async fn run_pipeline<S, D>(source: S, destination: D) -> LoaderResult<usize>
where
    S: Source,
    D: Destination,
{
    let pipeline = Pipeline::new(source, destination);
    let count = pipeline.run().await?;

    Ok(count)
}
