use std::time::Duration;

use config::shared::SourceConfig;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::error::{ErrorKind, EtlResult};
use crate::source::Source;
use crate::types::ExtractedChapter;
use crate::{bail, etl_error};

/// Attribute holding the chapter identifier.
pub const CHAPTER_ID_ATTRIBUTE: &str = "ChapterID";
/// Attribute holding the university chapter name.
pub const CHAPTER_NAME_ATTRIBUTE: &str = "University_Chapter";
/// Attribute holding the city.
pub const CITY_ATTRIBUTE: &str = "City";
/// Attribute holding the state.
pub const STATE_ATTRIBUTE: &str = "State";

/// Spatial reference requested for geometries (WGS 84 longitude/latitude).
const OUTPUT_SPATIAL_REFERENCE: &str = "4326";

/// Body of a feature query response.
///
/// Only the parts the extraction reads are modeled. A body without `features` is an
/// empty page.
#[derive(Debug, Default, Deserialize)]
pub struct FeatureQueryResponse {
    #[serde(default)]
    pub features: Option<Vec<Feature>>,
    /// Error object the service may return with a success status.
    #[serde(default)]
    pub error: Option<Value>,
}

/// One feature of a query page.
#[derive(Debug, Default, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Map<String, Value>>,
}

impl Feature {
    /// Maps the feature into an [`ExtractedChapter`], rendering every field as text.
    pub fn to_extracted_chapter(&self) -> ExtractedChapter {
        let attribute = |name: &str| text_field(self.attributes.as_ref(), name);
        let coordinate = |axis: &str| text_field(self.geometry.as_ref(), axis);

        ExtractedChapter {
            chapter_id: attribute(CHAPTER_ID_ATTRIBUTE),
            chapter_name: attribute(CHAPTER_NAME_ATTRIBUTE),
            city: attribute(CITY_ATTRIBUTE),
            state: attribute(STATE_ATTRIBUTE),
            latitude: coordinate("y"),
            longitude: coordinate("x"),
        }
    }
}

/// Returns the textual form of `key` in `map`, or an empty string when the map, the key or
/// the value is missing or null.
fn text_field(map: Option<&Map<String, Value>>, key: &str) -> String {
    match map.and_then(|map| map.get(key)) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(value)) => value.clone(),
        Some(value) => value.to_string(),
    }
}

/// Source that pages through an ArcGIS feature service query endpoint.
///
/// Pages are requested sequentially with an increasing `resultOffset`. Extraction stops on
/// an empty page or on a page shorter than the page size, so a final page that is exactly
/// full costs one extra, empty, request.
#[derive(Debug, Clone)]
pub struct FeatureServiceSource {
    client: reqwest::Client,
    url: String,
    page_size: u32,
}

impl FeatureServiceSource {
    /// Creates a source for the endpoint described by `config`.
    ///
    /// The per-request timeout is enforced by the underlying HTTP client on every page.
    pub fn new(config: &SourceConfig) -> EtlResult<FeatureServiceSource> {
        if config.page_size == 0 {
            bail!(
                ErrorKind::ConfigError,
                "Invalid page size",
                "the page size must be greater than 0"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| {
                etl_error!(
                    ErrorKind::ConfigError,
                    "Failed to build the feature service HTTP client",
                    err,
                    source: err
                )
            })?;

        Ok(FeatureServiceSource {
            client,
            url: config.url.clone(),
            page_size: config.page_size,
        })
    }

    /// Requests a single page starting at `offset`.
    ///
    /// Transport failures, timeouts, non-success statuses and undecodable bodies all
    /// surface as network failures.
    pub async fn fetch_page(&self, offset: u64) -> EtlResult<FeatureQueryResponse> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("where", "1=1"),
                ("outFields", "*"),
                ("outSR", OUTPUT_SPATIAL_REFERENCE),
                ("f", "json"),
            ])
            .query(&[
                ("resultOffset", offset),
                ("resultRecordCount", u64::from(self.page_size)),
            ])
            .send()
            .await?
            .error_for_status()?;

        let page = response.json::<FeatureQueryResponse>().await?;

        if let Some(service_error) = &page.error {
            warn!(offset, error = %service_error, "feature service returned an error body");
        }

        Ok(page)
    }

    async fn fetch_all_pages(&self) -> EtlResult<Vec<ExtractedChapter>> {
        let page_size = self.page_size as usize;
        let mut chapters = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let page = match self.fetch_page(offset).await {
                Ok(page) => page,
                Err(err) => {
                    error!(offset, error = %err, "failed to fetch chapters");
                    return Err(err);
                }
            };

            let features = page.features.unwrap_or_default();
            if features.is_empty() {
                info!("no more features to fetch");
                break;
            }

            debug!(offset, features = features.len(), "fetched feature page");
            chapters.extend(features.iter().map(Feature::to_extracted_chapter));

            if features.len() < page_size {
                info!("end of features reached");
                break;
            }

            offset += u64::from(self.page_size);
        }

        Ok(chapters)
    }
}

impl Source for FeatureServiceSource {
    fn name() -> &'static str {
        "feature_service"
    }

    async fn fetch_all(&self) -> EtlResult<Vec<ExtractedChapter>> {
        info!(url = %self.url, page_size = self.page_size, "starting chapter extraction");

        let chapters = self.fetch_all_pages().await?;

        info!(total = chapters.len(), "chapter extraction complete");

        Ok(chapters)
    }
}
