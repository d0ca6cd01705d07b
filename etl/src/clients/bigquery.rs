use std::fmt;

use gcp_bigquery_client::Client;
use gcp_bigquery_client::client_builder::ClientBuilder;
use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::model::dataset::Dataset;
use gcp_bigquery_client::model::table::Table;
use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;
use gcp_bigquery_client::model::table_field_schema::TableFieldSchema;
use gcp_bigquery_client::model::table_schema::TableSchema;
use gcp_bigquery_client::yup_oauth2::parse_service_account_key;
use tracing::{error, info};

use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::types::ChapterRecord;
use crate::{bail, etl_error};

/// Storage location of datasets created by the client.
pub const DATASET_LOCATION: &str = "US";

/// Longest dataset or table id BigQuery accepts.
const MAX_IDENTIFIER_LEN: usize = 1024;

/// A client for the parts of the BigQuery REST API the chapter load needs.
///
/// All operations target `project_id`. Dataset and table identifiers are validated before
/// any request is sent.
pub struct BigQueryClient {
    project_id: String,
    client: Client,
}

impl BigQueryClient {
    /// Creates a new [`BigQueryClient`] from a service account key file.
    pub async fn new_with_key_path(
        project_id: String,
        sa_key_path: &str,
    ) -> EtlResult<BigQueryClient> {
        validate_project_id(&project_id)?;

        let client = ClientBuilder::new()
            .build_from_service_account_key_file(sa_key_path)
            .await?;

        Ok(BigQueryClient { project_id, client })
    }

    /// Creates a new [`BigQueryClient`] from the JSON text of a service account key.
    pub async fn new_with_key(project_id: String, sa_key: &str) -> EtlResult<BigQueryClient> {
        validate_project_id(&project_id)?;

        let sa_key = parse_service_account_key(sa_key).map_err(BQError::from)?;
        let client = ClientBuilder::new()
            .build_from_service_account_key(sa_key, false)
            .await?;

        Ok(BigQueryClient { project_id, client })
    }

    /// Creates a new [`BigQueryClient`] using application default credentials.
    pub async fn new_with_adc(project_id: String) -> EtlResult<BigQueryClient> {
        validate_project_id(&project_id)?;

        let client = ClientBuilder::new()
            .build_from_application_default_credentials()
            .await?;

        Ok(BigQueryClient { project_id, client })
    }

    /// Creates a new [`BigQueryClient`] talking to custom auth and API base urls.
    ///
    /// Meant for tests against mock servers.
    pub async fn new_with_custom_urls(
        project_id: String,
        auth_base_url: String,
        v2_base_url: String,
        sa_key: &str,
    ) -> EtlResult<BigQueryClient> {
        validate_project_id(&project_id)?;

        let sa_key = parse_service_account_key(sa_key).map_err(BQError::from)?;
        let client = ClientBuilder::new()
            .with_auth_base_url(auth_base_url)
            .with_v2_base_url(v2_base_url)
            .build_from_service_account_key(sa_key, false)
            .await?;

        Ok(BigQueryClient { project_id, client })
    }

    /// Returns the project the client operates on.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns `<project>.<dataset>.<table>`.
    pub fn full_table_name(&self, dataset_id: &str, table_id: &str) -> String {
        format!("{}.{}.{}", self.project_id, dataset_id, table_id)
    }

    /// Checks whether a dataset exists.
    ///
    /// A 404 means it does not; any other failure is an error.
    pub async fn dataset_exists(&self, dataset_id: &str) -> EtlResult<bool> {
        validate_dataset_id(dataset_id)?;

        let result = self
            .client
            .dataset()
            .get(&self.project_id, dataset_id)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(BQError::ResponseError { error }) if error.error.code == 404 => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Creates a dataset in [`DATASET_LOCATION`].
    pub async fn create_dataset(&self, dataset_id: &str) -> EtlResult<()> {
        validate_dataset_id(dataset_id)?;

        info!(
            project_id = %self.project_id,
            dataset_id,
            location = DATASET_LOCATION,
            "creating dataset in bigquery"
        );

        let dataset = Dataset::new(&self.project_id, dataset_id).location(DATASET_LOCATION);
        self.client.dataset().create(dataset).await?;

        Ok(())
    }

    /// Checks whether a table exists.
    ///
    /// A 404 means it does not; any other failure is an error.
    pub async fn table_exists(&self, dataset_id: &str, table_id: &str) -> EtlResult<bool> {
        validate_dataset_id(dataset_id)?;
        validate_table_id(table_id)?;

        let result = self
            .client
            .table()
            .get(&self.project_id, dataset_id, table_id, None)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(BQError::ResponseError { error }) if error.error.code == 404 => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Creates the chapters table with [`chapter_table_schema`].
    pub async fn create_table(&self, dataset_id: &str, table_id: &str) -> EtlResult<()> {
        validate_dataset_id(dataset_id)?;
        validate_table_id(table_id)?;

        let full_table_name = self.full_table_name(dataset_id, table_id);
        info!(%full_table_name, "creating table in bigquery");

        let table = Table::new(
            &self.project_id,
            dataset_id,
            table_id,
            chapter_table_schema(),
        );
        self.client.table().create(table).await?;

        Ok(())
    }

    /// Inserts all records with a single streaming `insertAll` request.
    ///
    /// Rows rejected by BigQuery are logged and returned as one aggregated
    /// [`ErrorKind::DestinationError`], one inner error per rejected row.
    pub async fn insert_rows(
        &self,
        dataset_id: &str,
        table_id: &str,
        records: &[ChapterRecord],
    ) -> EtlResult<()> {
        validate_dataset_id(dataset_id)?;
        validate_table_id(table_id)?;

        let mut request = TableDataInsertAllRequest::new();
        for record in records {
            request.add_row(None, record)?;
        }

        let response = self
            .client
            .tabledata()
            .insert_all(&self.project_id, dataset_id, table_id, request)
            .await?;

        let Some(insert_errors) = response.insert_errors.filter(|errors| !errors.is_empty())
        else {
            return Ok(());
        };

        let full_table_name = self.full_table_name(dataset_id, table_id);
        let mut row_errors = Vec::with_capacity(insert_errors.len());
        for insert_error in insert_errors {
            let detail = format!("row {:?}: {:?}", insert_error.index, insert_error.errors);
            error!(%full_table_name, %detail, "bigquery rejected row");

            row_errors.push(etl_error!(
                ErrorKind::DestinationError,
                "BigQuery rejected a row",
                detail
            ));
        }

        Err(EtlError::from(row_errors))
    }
}

impl fmt::Debug for BigQueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigQueryClient")
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Schema of the chapters table. All columns are nullable.
pub fn chapter_table_schema() -> TableSchema {
    TableSchema::new(vec![
        TableFieldSchema::string("chapter_id"),
        TableFieldSchema::string("chapter_name"),
        TableFieldSchema::string("city"),
        TableFieldSchema::string("state"),
        TableFieldSchema::float("latitude"),
        TableFieldSchema::float("longitude"),
        TableFieldSchema::timestamp("loaded_at"),
    ])
}

fn validate_project_id(project_id: &str) -> EtlResult<()> {
    if project_id.trim().is_empty() {
        bail!(ErrorKind::InvalidData, "Empty BigQuery project id");
    }

    // Domain-scoped projects look like `example.com:my-project`.
    let valid = project_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if !valid {
        bail!(
            ErrorKind::InvalidData,
            "Invalid BigQuery project id",
            format!("project id {project_id:?} contains unsupported characters")
        );
    }

    Ok(())
}

/// Validates a dataset id: letters, digits and underscores.
pub(crate) fn validate_dataset_id(dataset_id: &str) -> EtlResult<()> {
    validate_identifier("dataset id", dataset_id, |c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates a table id: letters, digits, underscores and hyphens.
pub(crate) fn validate_table_id(table_id: &str) -> EtlResult<()> {
    validate_identifier("table id", table_id, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
    })
}

fn validate_identifier(
    what: &'static str,
    identifier: &str,
    is_allowed: impl Fn(char) -> bool,
) -> EtlResult<()> {
    if identifier.is_empty() {
        bail!(ErrorKind::InvalidData, "Empty BigQuery identifier", what);
    }

    if identifier.len() > MAX_IDENTIFIER_LEN {
        bail!(
            ErrorKind::InvalidData,
            "Invalid BigQuery identifier",
            format!("{what} is longer than {MAX_IDENTIFIER_LEN} bytes")
        );
    }

    if !identifier.chars().all(is_allowed) {
        bail!(
            ErrorKind::InvalidData,
            "Invalid BigQuery identifier",
            format!("{what} {identifier:?} contains unsupported characters")
        );
    }

    Ok(())
}
