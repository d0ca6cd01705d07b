use std::time::Duration;

use config::shared::SourceConfig;
use etl::error::ErrorKind;
use etl::source::{FeatureServiceSource, Source};
use etl::types::ExtractedChapter;
use etl::test_utils::feature_service::{
    FeatureServiceMock, QUERY_PATH, numbered_features, page, two_chapter_page,
};
use serde_json::json;
use telemetry::tracing::init_test_tracing;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn single_short_page_yields_complete_chapters() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(0, two_chapter_page()).await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let chapters = source.fetch_all().await.unwrap();

    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].chapter_id, "FL-0110");
    assert_eq!(chapters[0].chapter_name, "Florida State University");
    assert_eq!(chapters[0].latitude, "30.438110943");
    assert_eq!(chapters[0].longitude, "-84.304272637");
    assert_eq!(chapters[1].chapter_id, "CA-0220");
    for chapter in &chapters {
        for value in [
            &chapter.chapter_id,
            &chapter.chapter_name,
            &chapter.city,
            &chapter.state,
            &chapter.latitude,
            &chapter.longitude,
        ] {
            assert!(!value.is_empty(), "empty field in {chapter:?}");
        }
    }

    assert_eq!(mock.requested_offsets().await, [0]);
    assert_eq!(mock.requested_page_sizes().await, [100]);
}

#[tokio::test]
async fn empty_first_page_yields_nothing() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(0, page(vec![])).await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let chapters = source.fetch_all().await.unwrap();

    assert!(chapters.is_empty());
    assert_eq!(mock.requested_offsets().await, [0]);
}

#[tokio::test]
async fn missing_features_key_is_an_empty_page() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(0, json!({"exceededTransferLimit": false}))
        .await;

    let source = FeatureServiceSource::new(&mock.source_config(10)).unwrap();

    assert!(source.fetch_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn full_page_triggers_one_more_request() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(0, page(numbered_features(0, 3))).await;
    mock.mock_page(3, page(vec![])).await;

    let source = FeatureServiceSource::new(&mock.source_config(3)).unwrap();
    let chapters = source.fetch_all().await.unwrap();

    assert_eq!(chapters.len(), 3);
    assert_eq!(mock.requested_offsets().await, [0, 3]);
}

#[tokio::test]
async fn request_count_follows_total_and_page_size() {
    init_test_tracing();

    // (total features, page size)
    let cases = [(0, 5), (4, 5), (5, 5), (7, 3), (9, 3), (1, 1)];

    for (total, page_size) in cases {
        let mock = FeatureServiceMock::start().await;

        let mut expected_offsets = Vec::new();
        let mut offset = 0;
        while offset < total {
            let count = page_size.min(total - offset);
            mock.mock_page(offset as u64, page(numbered_features(offset, count)))
                .await;
            expected_offsets.push(offset as u64);
            offset += page_size;
        }
        if total % page_size == 0 {
            mock.mock_page(total as u64, page(vec![])).await;
            expected_offsets.push(total as u64);
        }

        let source = FeatureServiceSource::new(&mock.source_config(page_size as u32)).unwrap();
        let chapters = source.fetch_all().await.unwrap();

        let data_requests = total.div_ceil(page_size);
        let terminal_requests = usize::from(total > 0 && total % page_size == 0);
        let expected_requests = if total == 0 {
            1
        } else {
            data_requests + terminal_requests
        };

        assert_eq!(chapters.len(), total, "total {total}, page size {page_size}");
        assert_eq!(mock.requested_offsets().await, expected_offsets);
        assert_eq!(expected_offsets.len(), expected_requests);

        let ids: Vec<String> = chapters.into_iter().map(|c| c.chapter_id).collect();
        let expected_ids: Vec<String> = (0..total).map(|n| format!("TX-{n:04}")).collect();
        assert_eq!(ids, expected_ids);
    }
}

#[tokio::test]
async fn null_and_missing_values_become_empty_strings() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(
        0,
        json!({
            "features": [
                {
                    "attributes": {"ChapterID": "GA-0001", "University_Chapter": null},
                    "geometry": null
                },
                {"attributes": {"City": "Athens", "State": "GA"}, "geometry": {"x": 1.5}},
                {}
            ]
        }),
    )
    .await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let chapters = source.fetch_all().await.unwrap();

    assert_eq!(chapters.len(), 3);
    assert_eq!(chapters[0].chapter_id, "GA-0001");
    assert_eq!(chapters[0].chapter_name, "");
    assert_eq!(chapters[0].latitude, "");
    assert_eq!(chapters[1].chapter_id, "");
    assert_eq!(chapters[1].city, "Athens");
    assert_eq!(chapters[1].longitude, "1.5");
    assert_eq!(chapters[1].latitude, "");
    assert_eq!(chapters[2], ExtractedChapter::default());
}

#[tokio::test]
async fn server_error_aborts_the_whole_fetch() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_page(0, page(numbered_features(0, 2))).await;
    mock.mock_status(2, 500).await;

    let source = FeatureServiceSource::new(&mock.source_config(2)).unwrap();
    let err = source.fetch_all().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
    assert!(err.is_network_failure());
    assert_eq!(mock.requested_offsets().await, [0, 2]);
}

#[tokio::test]
async fn undecodable_body_is_a_network_failure() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    mock.mock_garbage(0).await;

    let source = FeatureServiceSource::new(&mock.source_config(100)).unwrap();
    let err = source.fetch_all().await.unwrap_err();

    assert!(err.is_network_failure());
}

#[tokio::test]
async fn slow_page_times_out() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(two_chapter_page())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&*mock)
        .await;

    let config = SourceConfig {
        request_timeout_ms: 100,
        ..mock.source_config(100)
    };
    let source = FeatureServiceSource::new(&config).unwrap();
    let err = source.fetch_all().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceTimeout);
    assert!(err.is_network_failure());
}

#[tokio::test]
async fn unreachable_host_is_a_network_failure() {
    init_test_tracing();

    let mock = FeatureServiceMock::start().await;
    let config = mock.source_config(100);
    drop(mock);

    let source = FeatureServiceSource::new(&config).unwrap();
    let err = source.fetch_all().await.unwrap_err();

    assert!(err.is_network_failure());
}
