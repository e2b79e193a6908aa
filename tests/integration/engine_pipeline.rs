// tests/integration/engine_pipeline.rs
//! Whole fetches against a mock catalog: paging, workers and lookups.

use crate::common::{fast_retry, fetcher, page};
use catalog_fetch::{FetchConfig, Filters, ReferenceMap};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEVICES_PATH: &str = "/api/dcim/devices/";

/// Serves 25 devices in pages of 10; each page must be requested exactly once.
async fn mount_device_pages(server: &MockServer) {
    for (offset, ids) in [(0, 1..=10), (10, 11..=20), (20, 21..=25)] {
        Mock::given(method("GET"))
            .and(path(DEVICES_PATH))
            .and(query_param("limit", "10"))
            .and(query_param("offset", offset.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(25, ids)))
            .expect(1)
            .mount(server)
            .await;
    }
}

fn ids(items: &[catalog_fetch::Item]) -> Vec<i64> {
    items.iter().map(|item| item.id).collect()
}

#[tokio::test]
async fn test_sequential_fetch_walks_every_page() {
    let server = MockServer::start().await;
    mount_device_pages(&server).await;

    let config = FetchConfig {
        page_limit: 10,
        ..FetchConfig::default()
    };
    let result = fetcher(*server.address(), config, fast_retry(1))
        .fetch(Filters::new())
        .await
        .unwrap();

    assert_eq!(ids(&result.data), (1..=25).collect::<Vec<_>>());
    assert_eq!(result.metadata.requests, 3);
    assert_eq!(result.metadata.param_sets, 1);
    assert!(!result.metadata.is_degraded());
}

#[tokio::test]
async fn test_parallel_fetch_probes_then_requests_windows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .and(query_param("brief", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(25, [1])))
        .expect(1)
        .mount(&server)
        .await;
    mount_device_pages(&server).await;

    let config = FetchConfig {
        page_limit: 10,
        thread_count: 3,
        interval: Duration::from_millis(5),
        ..FetchConfig::default()
    };
    let result = fetcher(*server.address(), config, fast_retry(1))
        .fetch(Filters::new())
        .await
        .unwrap();

    assert_eq!(ids(&result.data), (1..=25).collect::<Vec<_>>());
    assert_eq!(result.metadata.requests, 4);
    assert_eq!(result.metadata.items_received, 25);
}

#[tokio::test]
async fn test_status_values_are_requested_separately() {
    let server = MockServer::start().await;
    for (status, ids) in [("active", vec![3, 1]), ("planned", vec![2, 3])] {
        Mock::given(method("GET"))
            .and(path(DEVICES_PATH))
            .and(query_param("status", status))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(ids.len(), ids)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = FetchConfig {
        page_limit: 10,
        ..FetchConfig::default()
    };
    let result = fetcher(*server.address(), config, fast_retry(1))
        .fetch(Filters::new().with("status", ["active", "planned"]))
        .await
        .unwrap();

    assert_eq!(ids(&result.data), vec![1, 2, 3]);
    assert_eq!(result.metadata.param_sets, 2);
    assert_eq!(result.metadata.items_received, 4);
}

#[tokio::test]
async fn test_site_names_are_resolved_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "results": [
                { "id": 7, "slug": "hq" },
                { "id": 8, "slug": "dc1" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .and(query_param("site_id", "8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, [40])))
        .expect(1)
        .mount(&server)
        .await;

    let config = FetchConfig {
        page_limit: 10,
        ..FetchConfig::default()
    };
    let result = fetcher(*server.address(), config, fast_retry(1))
        .with_references(ReferenceMap::new().with("site", "dcim/sites/", "slug"))
        .fetch(Filters::new().with("site", "dc1"))
        .await
        .unwrap();

    assert_eq!(ids(&result.data), vec![40]);
    assert_eq!(result.metadata.requests, 2);
}

#[tokio::test]
async fn test_long_id_lists_are_split_across_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, [1])))
        .mount(&server)
        .await;

    let config = FetchConfig {
        page_limit: 10,
        url_max_len: 300,
        ..FetchConfig::default()
    };
    let wanted: Vec<i64> = (1000..1060).collect();
    let result = fetcher(*server.address(), config, fast_retry(1))
        .fetch(Filters::new().with("id", wanted))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(result.metadata.param_sets > 1);
    assert_eq!(requests.len(), result.metadata.param_sets);
    assert!(requests.iter().all(|request| request.url.as_str().len() <= 300));
    assert_eq!(ids(&result.data), vec![1]);
}
