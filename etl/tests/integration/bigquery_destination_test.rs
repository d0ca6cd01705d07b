use chrono::{TimeZone, Utc};
use etl::conversions::chapter::normalize_chapters_at;
use etl::destination::Destination;
use etl::error::ErrorKind;
use etl::test_utils::bigquery::{BigQueryMock, GoogleAuthMock, build_destination};
use etl::types::{CHAPTER_COLUMNS, ChapterRecord, ExtractedChapter};
use telemetry::tracing::init_test_tracing;

const DATASET_ID: &str = "du_data";
const TABLE_ID: &str = "university_chapters";

fn chapter_records() -> Vec<ChapterRecord> {
    let chapters = vec![
        ExtractedChapter {
            chapter_id: "FL-0110".to_string(),
            chapter_name: "Florida State University".to_string(),
            city: "Tallahassee".to_string(),
            state: "FL".to_string(),
            latitude: "30.438110943".to_string(),
            longitude: "-84.304272637".to_string(),
        },
        ExtractedChapter {
            chapter_id: "CA-0220".to_string(),
            chapter_name: "Stanford University".to_string(),
            city: "Stanford".to_string(),
            state: "CA".to_string(),
            latitude: String::new(),
            longitude: String::new(),
        },
    ];

    let loaded_at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
    normalize_chapters_at(chapters, loaded_at).unwrap()
}

#[tokio::test]
async fn missing_dataset_and_table_are_created_before_insert() {
    init_test_tracing();

    let google_auth = GoogleAuthMock::start().await;
    google_auth.mock_token(1..).await;

    let bigquery = BigQueryMock::start(DATASET_ID, TABLE_ID).await;
    bigquery.mock_dataset_missing().await;
    bigquery.mock_dataset_create(1).await;
    bigquery.mock_table_missing().await;
    bigquery.mock_table_create(1).await;
    bigquery.mock_insert_all(1).await;

    let destination = build_destination(&google_auth, &bigquery).await.unwrap();
    destination.load(chapter_records()).await.unwrap();

    let creations = bigquery.creation_requests().await;
    assert_eq!(creations.len(), 2);

    let dataset = &creations[0];
    assert_eq!(dataset["datasetReference"]["datasetId"], DATASET_ID);
    assert_eq!(dataset["location"], "US");

    let table = &creations[1];
    assert_eq!(table["tableReference"]["tableId"], TABLE_ID);
    let columns: Vec<&str> = table["schema"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["name"].as_str().unwrap())
        .collect();
    assert_eq!(columns, CHAPTER_COLUMNS);

    let rows = bigquery.inserted_rows().await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["chapter_id"], "FL-0110");
    assert_eq!(rows[0]["latitude"], 30.438110943);
    assert_eq!(rows[0]["loaded_at"], "2025-03-01T08:00:00.000000+00:00");
    assert_eq!(rows[1]["chapter_id"], "CA-0220");
    assert!(rows[1]["latitude"].is_null());
    assert!(rows[1]["longitude"].is_null());
}

#[tokio::test]
async fn existing_dataset_and_table_are_left_untouched() {
    init_test_tracing();

    let google_auth = GoogleAuthMock::start().await;
    google_auth.mock_token(1..).await;

    let bigquery = BigQueryMock::start(DATASET_ID, TABLE_ID).await;
    bigquery.mock_dataset_exists().await;
    bigquery.mock_dataset_create(0).await;
    bigquery.mock_table_exists().await;
    bigquery.mock_table_create(0).await;
    bigquery.mock_insert_all(1).await;

    let destination = build_destination(&google_auth, &bigquery).await.unwrap();
    destination.load(chapter_records()).await.unwrap();

    assert!(bigquery.creation_requests().await.is_empty());
    assert_eq!(bigquery.inserted_rows().await.len(), 2);
}

#[tokio::test]
async fn rejected_rows_fail_the_load() {
    init_test_tracing();

    let google_auth = GoogleAuthMock::start().await;
    google_auth.mock_token(1..).await;

    let bigquery = BigQueryMock::start(DATASET_ID, TABLE_ID).await;
    bigquery.mock_dataset_exists().await;
    bigquery.mock_table_exists().await;
    bigquery.mock_insert_all_with_row_errors(&[0, 1]).await;

    let destination = build_destination(&google_auth, &bigquery).await.unwrap();
    let err = destination.load(chapter_records()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationError);
    assert_eq!(err.errors().len(), 2);
    assert!(err.is_warehouse_failure());
    assert!(err.to_string().contains("Cannot convert value to floating point."));
}

#[tokio::test]
async fn lookup_failure_is_returned_without_inserting() {
    init_test_tracing();

    let google_auth = GoogleAuthMock::start().await;
    google_auth.mock_token(1..).await;

    let bigquery = BigQueryMock::start(DATASET_ID, TABLE_ID).await;
    bigquery.mock_dataset_lookup_failure().await;
    bigquery.mock_dataset_create(0).await;
    bigquery.mock_insert_all(0).await;

    let destination = build_destination(&google_auth, &bigquery).await.unwrap();
    let err = destination.load(chapter_records()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationQueryFailed);
    assert!(err.is_warehouse_failure());
}

#[tokio::test]
async fn empty_batch_sends_no_requests() {
    init_test_tracing();

    let google_auth = GoogleAuthMock::start().await;
    let bigquery = BigQueryMock::start(DATASET_ID, TABLE_ID).await;

    let destination = build_destination(&google_auth, &bigquery).await.unwrap();
    destination.load(vec![]).await.unwrap();

    assert!(bigquery.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn invalid_table_id_is_rejected_before_any_request() {
    init_test_tracing();

    let google_auth = GoogleAuthMock::start().await;
    let bigquery = BigQueryMock::start(DATASET_ID, "chapters; drop").await;

    let err = build_destination(&google_auth, &bigquery).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(google_auth.received_requests().await.unwrap_or_default().is_empty());
    assert!(bigquery.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn hyphenated_dataset_id_is_rejected_before_any_request() {
    init_test_tracing();

    let google_auth = GoogleAuthMock::start().await;
    let bigquery = BigQueryMock::start("du-data", TABLE_ID).await;

    let err = build_destination(&google_auth, &bigquery).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(bigquery.received_requests().await.unwrap_or_default().is_empty());
}
