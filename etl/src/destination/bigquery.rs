use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::bigquery::{BigQueryClient, validate_dataset_id, validate_table_id};
use crate::destination::Destination;
use crate::error::EtlResult;
use crate::types::ChapterRecord;

struct Inner {
    client: BigQueryClient,
    dataset_id: String,
    table_id: String,
}

/// Loads chapter records into `<project>.<dataset>.<table>`.
///
/// Every load first makes sure the dataset and the table exist, creating whichever is
/// missing, then streams the whole batch with one insert request. Existing datasets and
/// tables are used as they are: their schema is never checked or migrated. The
/// check-then-create sequence is not atomic, so two concurrent loads against an empty
/// project may both try to create the same objects.
#[derive(Clone)]
pub struct BigQueryDestination {
    inner: Arc<Inner>,
}

impl BigQueryDestination {
    /// Creates a destination authenticating with a service account key file.
    pub async fn new_with_key_path(
        project_id: String,
        dataset_id: String,
        table_id: String,
        sa_key_path: &str,
    ) -> EtlResult<Self> {
        validate_target(&dataset_id, &table_id)?;

        let client = BigQueryClient::new_with_key_path(project_id, sa_key_path).await?;

        Ok(Self::from_parts(client, dataset_id, table_id))
    }

    /// Creates a destination authenticating with the JSON text of a service account key.
    pub async fn new_with_key(
        project_id: String,
        dataset_id: String,
        table_id: String,
        sa_key: &str,
    ) -> EtlResult<Self> {
        validate_target(&dataset_id, &table_id)?;

        let client = BigQueryClient::new_with_key(project_id, sa_key).await?;

        Ok(Self::from_parts(client, dataset_id, table_id))
    }

    /// Creates a destination authenticating with application default credentials.
    pub async fn new_with_adc(
        project_id: String,
        dataset_id: String,
        table_id: String,
    ) -> EtlResult<Self> {
        validate_target(&dataset_id, &table_id)?;

        let client = BigQueryClient::new_with_adc(project_id).await?;

        Ok(Self::from_parts(client, dataset_id, table_id))
    }

    /// Creates a destination talking to custom auth and API base urls, for tests.
    pub async fn new_with_urls(
        project_id: String,
        dataset_id: String,
        table_id: String,
        auth_base_url: String,
        v2_base_url: String,
        sa_key: &str,
    ) -> EtlResult<Self> {
        validate_target(&dataset_id, &table_id)?;

        let client =
            BigQueryClient::new_with_custom_urls(project_id, auth_base_url, v2_base_url, sa_key)
                .await?;

        Ok(Self::from_parts(client, dataset_id, table_id))
    }

    /// Wraps an existing client.
    ///
    /// Fails with [`crate::error::ErrorKind::InvalidData`] when either id is not a valid
    /// BigQuery identifier.
    pub fn new(client: BigQueryClient, dataset_id: String, table_id: String) -> EtlResult<Self> {
        validate_target(&dataset_id, &table_id)?;

        Ok(Self::from_parts(client, dataset_id, table_id))
    }

    fn from_parts(client: BigQueryClient, dataset_id: String, table_id: String) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                dataset_id,
                table_id,
            }),
        }
    }

    /// Returns `<project>.<dataset>.<table>`.
    pub fn full_table_name(&self) -> String {
        self.inner
            .client
            .full_table_name(&self.inner.dataset_id, &self.inner.table_id)
    }

    async fn ensure_dataset(&self) -> EtlResult<()> {
        let inner = &self.inner;
        let dataset = format!("{}.{}", inner.client.project_id(), inner.dataset_id);

        if inner.client.dataset_exists(&inner.dataset_id).await? {
            info!(%dataset, "dataset exists");
            return Ok(());
        }

        info!(%dataset, "dataset not found, creating it");
        inner.client.create_dataset(&inner.dataset_id).await
    }

    async fn ensure_table(&self) -> EtlResult<()> {
        let inner = &self.inner;
        let table = self.full_table_name();

        if inner
            .client
            .table_exists(&inner.dataset_id, &inner.table_id)
            .await?
        {
            info!(%table, "table exists");
            return Ok(());
        }

        info!(%table, "table not found, creating it");
        inner
            .client
            .create_table(&inner.dataset_id, &inner.table_id)
            .await
    }

    async fn load_records(&self, records: &[ChapterRecord]) -> EtlResult<()> {
        self.ensure_dataset().await?;
        self.ensure_table().await?;

        self.inner
            .client
            .insert_rows(&self.inner.dataset_id, &self.inner.table_id, records)
            .await
    }
}

fn validate_target(dataset_id: &str, table_id: &str) -> EtlResult<()> {
    validate_dataset_id(dataset_id)?;
    validate_table_id(table_id)
}

impl fmt::Debug for BigQueryDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigQueryDestination")
            .field("client", &self.inner.client)
            .field("dataset_id", &self.inner.dataset_id)
            .field("table_id", &self.inner.table_id)
            .finish()
    }
}

impl Destination for BigQueryDestination {
    fn name() -> &'static str {
        "bigquery"
    }

    async fn load(&self, records: Vec<ChapterRecord>) -> EtlResult<()> {
        info!("starting bigquery load");

        if records.is_empty() {
            warn!("no records provided, skipping load");
            return Ok(());
        }

        let table = self.full_table_name();
        match self.load_records(&records).await {
            Ok(()) => {
                info!(rows = records.len(), %table, "successfully inserted rows");
                Ok(())
            }
            Err(err) => {
                error!(severity = "CRITICAL", %table, error = %err, "bigquery load failed");
                Err(err)
            }
        }
    }
}
