use etl::destination::memory::MemoryDestination;
use etl::error::ErrorKind;
use etl::pipeline::Pipeline;
use etl::source::FeatureServiceSource;
use etl::test_utils::bigquery::{BigQueryMock, GoogleAuthMock, build_destination};
use etl::test_utils::feature_service::{FeatureServiceMock, feature, page, two_chapter_page};
use serde_json::json;
use telemetry::tracing::init_test_tracing;

#[tokio::test]
async fn chapters_are_extracted_normalized_and_loaded() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(
        0,
        page(vec![
            feature(
                " FL-0110 ",
                "Florida State University  ",
                "Tallahassee",
                "FL",
                -84.304272637,
                30.438110943,
            ),
            feature(
                "CA-0220",
                "Stanford University",
                " Stanford",
                "CA",
                -122.1687,
                37.4275,
            ),
        ]),
    )
    .await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(source, destination.clone());

    let loaded = pipeline.run().await.unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(destination.load_calls().await, 1);

    let records = destination.records().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].chapter_id, "FL-0110");
    assert_eq!(records[0].chapter_name, "Florida State University");
    assert_eq!(records[0].latitude, Some(30.438110943));
    assert_eq!(records[0].longitude, Some(-84.304272637));
    assert_eq!(records[1].city, "Stanford");
    assert_eq!(records[0].loaded_at, records[1].loaded_at);
}

#[tokio::test]
async fn empty_extraction_skips_the_load() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(0, page(vec![])).await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(source, destination.clone());

    assert_eq!(pipeline.run().await.unwrap(), 0);
    assert_eq!(destination.load_calls().await, 0);
}

#[tokio::test]
async fn non_numeric_coordinate_fails_before_loading() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(
        0,
        json!({
            "features": [{
                "attributes": {
                    "ChapterID": "TX-0001",
                    "University_Chapter": "Texas A&M University",
                    "City": "College Station",
                    "State": "TX"
                },
                "geometry": {"x": -96.34, "y": "abc"}
            }]
        }),
    )
    .await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(source, destination.clone());

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConversionError);
    assert_eq!(destination.load_calls().await, 0);
}

#[tokio::test]
async fn network_failure_fails_before_loading() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_status(0, 503).await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let destination = MemoryDestination::new();
    let pipeline = Pipeline::new(source, destination.clone());

    let err = pipeline.run().await.unwrap_err();

    assert!(err.is_network_failure());
    assert_eq!(destination.load_calls().await, 0);
}

#[tokio::test]
async fn chapters_are_loaded_into_bigquery() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(0, two_chapter_page()).await;

    let google_auth = GoogleAuthMock::start().await;
    google_auth.mock_token(1..).await;

    let bigquery = BigQueryMock::start("du_data", "university_chapters").await;
    bigquery.mock_dataset_missing().await;
    bigquery.mock_dataset_create(1).await;
    bigquery.mock_table_missing().await;
    bigquery.mock_table_create(1).await;
    bigquery.mock_insert_all(1).await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let destination = build_destination(&google_auth, &bigquery).await.unwrap();
    let pipeline = Pipeline::new(source, destination);

    assert_eq!(pipeline.run().await.unwrap(), 2);

    let rows = bigquery.inserted_rows().await;
    assert_eq!(rows.len(), 2);
    for row in &rows {
        let loaded_at = row["loaded_at"].as_str().unwrap();
        assert!(loaded_at.ends_with("+00:00"), "unexpected loaded_at {loaded_at}");
    }
    assert_eq!(rows[0]["loaded_at"], rows[1]["loaded_at"]);
}

#[tokio::test]
async fn warehouse_failure_is_returned_unchanged() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(0, two_chapter_page()).await;

    let google_auth = GoogleAuthMock::start().await;
    google_auth.mock_token(1..).await;

    let bigquery = BigQueryMock::start("du_data", "university_chapters").await;
    bigquery.mock_dataset_exists().await;
    bigquery.mock_table_exists().await;
    bigquery.mock_insert_all_with_row_errors(&[1]).await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let destination = build_destination(&google_auth, &bigquery).await.unwrap();
    let pipeline = Pipeline::new(source, destination);

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationError);
    assert!(err.is_warehouse_failure());
}
