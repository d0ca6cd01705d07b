use std::ops::Deref;

use config::shared::SourceConfig;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mocked query endpoint is served on.
pub const QUERY_PATH: &str = "/arcgis/rest/services/UniversityChapters_Public/FeatureServer/0/query";

/// Mock of a feature service query endpoint.
///
/// Every mounted page only matches requests carrying the fixed query parameters, so a
/// request with a wrong protocol shape falls through to wiremock's 404.
pub struct FeatureServiceMock {
    server: MockServer,
}

impl FeatureServiceMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Returns the query endpoint url.
    pub fn query_url(&self) -> String {
        format!("{}{}", self.server.uri(), QUERY_PATH)
    }

    /// Returns a source configuration pointing at this mock.
    pub fn source_config(&self, page_size: u32) -> SourceConfig {
        SourceConfig {
            url: self.query_url(),
            page_size,
            request_timeout_ms: 5_000,
        }
    }

    /// Serves `body` exactly once for the page starting at `offset`.
    pub async fn mock_page(&self, offset: u64, body: Value) {
        self.mock_offset(offset, ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    /// Answers the page starting at `offset` with `status` and an empty body.
    pub async fn mock_status(&self, offset: u64, status: u16) {
        self.mock_offset(offset, ResponseTemplate::new(status))
            .await;
    }

    /// Serves a body that is not JSON for the page starting at `offset`.
    pub async fn mock_garbage(&self, offset: u64) {
        self.mock_offset(
            offset,
            ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
        )
        .await;
    }

    async fn mock_offset(&self, offset: u64, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .and(query_param("where", "1=1"))
            .and(query_param("outFields", "*"))
            .and(query_param("outSR", "4326"))
            .and(query_param("f", "json"))
            .and(query_param("resultOffset", offset.to_string()))
            .respond_with(response)
            .named(format!("feature page at offset {offset}"))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Returns the `resultOffset` of every received request, in arrival order.
    pub async fn requested_offsets(&self) -> Vec<u64> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| {
                request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "resultOffset")
                    .and_then(|(_, value)| value.parse().ok())
            })
            .collect()
    }

    /// Returns the `resultRecordCount` of every received request, in arrival order.
    pub async fn requested_page_sizes(&self) -> Vec<u32> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| {
                request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "resultRecordCount")
                    .and_then(|(_, value)| value.parse().ok())
            })
            .collect()
    }
}

impl Deref for FeatureServiceMock {
    type Target = MockServer;

    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

/// Builds one feature with the given attributes and point geometry.
pub fn feature(
    chapter_id: &str,
    chapter_name: &str,
    city: &str,
    state: &str,
    x: f64,
    y: f64,
) -> Value {
    json!({
        "attributes": {
            "ChapterID": chapter_id,
            "University_Chapter": chapter_name,
            "City": city,
            "State": state
        },
        "geometry": {"x": x, "y": y}
    })
}

/// Wraps features into a query response body.
pub fn page(features: Vec<Value>) -> Value {
    json!({ "features": features })
}

/// Returns the two-chapter page used by the end-to-end scenarios.
pub fn two_chapter_page() -> Value {
    page(vec![
        feature(
            "FL-0110",
            "Florida State University",
            "Tallahassee",
            "FL",
            -84.304272637,
            30.438110943,
        ),
        feature(
            "CA-0220",
            "Stanford University",
            "Stanford",
            "CA",
            -122.1687,
            37.4275,
        ),
    ])
}

/// Returns `count` distinct features numbered from `first`.
pub fn numbered_features(first: usize, count: usize) -> Vec<Value> {
    (first..first + count)
        .map(|n| {
            feature(
                &format!("TX-{n:04}"),
                &format!("University {n}"),
                "Austin",
                "TX",
                -97.0 - n as f64 / 1000.0,
                30.0 + n as f64 / 1000.0,
            )
        })
        .collect()
}
