use std::time::Duration;

use mediadb_catalog::{Catalog, MediaDetailQuery, TrendingMedia};
use mediadb_graphql::{
    CancellationSignal, GraphqlClientBuilder, GraphqlClientError, GraphqlOperation,
    MSG_SERVICE_BUSY, RetryPolicy,
};
use mediadb_loader::{LoaderOptions, LoaderPhase, PageRequest};
use mediadb_testkit::{MockGraphqlServer, fixtures, init_test_tracing};

fn catalog_for(server: &MockGraphqlServer) -> Catalog {
    let client = GraphqlClientBuilder::new(server.url())
        .with_retry_policy(RetryPolicy::default().with_jitter(false).with_delays(
            Duration::from_millis(1),
            Duration::from_millis(1),
            Duration::from_millis(10),
        ))
        .build()
        .unwrap();
    Catalog::new(client)
}

fn page_request(page: u32, per_page: u32) -> PageRequest {
    PageRequest {
        page,
        per_page,
        signal: CancellationSignal::new(),
    }
}

#[tokio::test]
async fn trending_page_requests_trending_order() {
    init_test_tracing();
    let server = MockGraphqlServer::start().await;
    server.expect_data(fixtures::page_data(&[7, 8], true)).await;
    let catalog = catalog_for(&server);

    let page = catalog.trending_page(page_request(3, 2)).await.unwrap();

    assert_eq!(
        page.items.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![7, 8]
    );
    assert!(page.has_next_page);
    assert_eq!(page.items[0].title.display(), "Title 7");

    let bodies = server.received_bodies().await;
    assert_eq!(bodies[0]["operationName"], TrendingMedia::OPERATION_NAME);
    assert_eq!(
        bodies[0]["variables"],
        serde_json::json!({"page": 3, "perPage": 2, "sort": ["TRENDING_DESC"]})
    );
}

#[tokio::test]
async fn missing_page_info_defers_to_item_count() {
    let server = MockGraphqlServer::start().await;
    server
        .expect_data(serde_json::json!({
            "Page": { "media": [fixtures::media(1)] }
        }))
        .await;
    let catalog = catalog_for(&server);

    let page = catalog.top_rated_page(page_request(1, 10)).await.unwrap();
    assert!(page.has_next_page);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn top_rated_loader_pages_to_the_end() {
    let server = MockGraphqlServer::start().await;
    server
        .expect_data_for(
            serde_json::json!({"page": 1}),
            fixtures::numbered_page_data(1, 2, 2, true),
        )
        .await;
    server
        .expect_data_for(
            serde_json::json!({"page": 2}),
            fixtures::numbered_page_data(2, 2, 2, false),
        )
        .await;
    let catalog = catalog_for(&server);
    let loader = catalog.top_rated_loader(LoaderOptions::default().with_per_page(2));

    loader.load_initial().await;
    assert_eq!(loader.snapshot().phase, LoaderPhase::Ready);
    loader.show_more().await;

    let snapshot = loader.snapshot();
    assert_eq!(
        snapshot.items.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert!(snapshot.ended);
    assert_eq!(snapshot.phase, LoaderPhase::Ended);

    let sorts: Vec<_> = server
        .received_bodies()
        .await
        .into_iter()
        .map(|body| body["variables"]["sort"].clone())
        .collect();
    assert!(sorts.iter().all(|sort| sort == &serde_json::json!(["SCORE_DESC"])));
}

#[tokio::test]
async fn loader_surfaces_classified_upstream_failure() {
    let server = MockGraphqlServer::start().await;
    server
        .expect_status(503, serde_json::json!({"error": "maintenance"}))
        .await;
    let catalog = catalog_for(&server);
    let loader = catalog.trending_loader(LoaderOptions::default());

    loader.load_initial().await;

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.phase, LoaderPhase::Error);
    let error = snapshot.error.unwrap();
    assert_eq!(error.user_message, MSG_SERVICE_BUSY);
    // One attempt plus the default two retries.
    server.assert_request_count(3).await;
    assert_eq!(catalog.client().limiter().in_flight(), 0);
}

#[tokio::test]
async fn media_detail_decodes_the_detail_view() {
    let server = MockGraphqlServer::start().await;
    server
        .expect_data(serde_json::json!({
            "Media": {
                "id": 154587,
                "title": { "romaji": "Sousou no Frieren", "english": "Frieren: Beyond Journey's End" },
                "description": "After the party<br>defeats the <i>Demon King</i>.",
                "startDate": { "year": 2023, "month": 9, "day": 29 },
                "genres": ["Adventure", "Drama"],
                "studios": {
                    "edges": [{ "isMain": true }],
                    "nodes": [{ "id": 11, "name": "Madhouse" }]
                },
                "nextAiringEpisode": null
            }
        }))
        .await;
    let catalog = catalog_for(&server);

    let detail = catalog.media_detail(154_587, None).await.unwrap();

    assert_eq!(detail.title.display(), "Frieren: Beyond Journey's End");
    assert_eq!(detail.start_date.unwrap().to_string(), "2023-09-29");
    assert_eq!(
        mediadb_catalog::sanitize_description(detail.description.as_deref().unwrap_or_default()),
        "After the party\ndefeats the Demon King."
    );
    assert_eq!(detail.genres, vec!["Adventure", "Drama"]);
    let bodies = server.received_bodies().await;
    assert_eq!(bodies[0]["operationName"], MediaDetailQuery::OPERATION_NAME);
    assert_eq!(bodies[0]["variables"], serde_json::json!({"id": 154_587}));
}

#[tokio::test]
async fn null_media_is_not_found() {
    let server = MockGraphqlServer::start().await;
    server
        .expect_data(serde_json::json!({ "Media": null }))
        .await;
    let catalog = catalog_for(&server);

    let err = catalog.media_detail(1, None).await.unwrap_err();

    assert!(matches!(err, GraphqlClientError::NotFound { .. }));
    assert_eq!(err.to_string(), "media 1 not found");
    server.assert_request_count(1).await;
}

#[tokio::test]
async fn upstream_404_error_is_not_found() {
    let server = MockGraphqlServer::start().await;
    server
        .expect_status(200, fixtures::graphql_error("Not Found.", Some(404)))
        .await;
    let catalog = catalog_for(&server);

    let err = catalog.media_detail(999_999, None).await.unwrap_err();

    assert!(matches!(err, GraphqlClientError::NotFound { .. }));
    server.assert_request_count(1).await;
}

#[tokio::test]
async fn cancelled_detail_request_reports_cancellation() {
    let server = MockGraphqlServer::start().await;
    server
        .expect_delayed(Duration::from_secs(2), serde_json::json!({ "Media": null }))
        .await;
    let catalog = catalog_for(&server);
    let signal = CancellationSignal::new();

    let trigger = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let err = catalog.media_detail(1, Some(signal)).await.unwrap_err();
    assert!(err.is_cancellation());
}
