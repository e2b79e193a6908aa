// tests/integration/http_client.rs
//! Response classification through the real HTTP client.

use crate::common::{fast_retry, fetcher, page, TEST_TOKEN};
use catalog_fetch::{AppError, FetchConfig, Filters};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEVICES_PATH: &str = "/api/dcim/devices/";

fn small_pages() -> FetchConfig {
    FetchConfig {
        page_limit: 10,
        ..FetchConfig::default()
    }
}

#[tokio::test]
async fn test_requests_carry_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .and(header("Authorization", format!("Token {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(2, [2, 1])))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(*server.address(), small_pages(), fast_retry(1))
        .fetch(Filters::new())
        .await
        .unwrap();

    let ids: Vec<i64> = result.data.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(result.metadata.requests, 1);
}

#[tokio::test]
async fn test_server_error_aborts_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher(*server.address(), small_pages(), fast_retry(3))
        .fetch(Filters::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AppError::ServerError { status: 500, .. }),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_invalid_token_is_a_credentials_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(r#"{"detail": "Invalid token"}"#),
        )
        .mount(&server)
        .await;

    let err = fetcher(*server.address(), small_pages(), fast_retry(1))
        .fetch(Filters::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AppError::InvalidCredentials { .. }),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_other_forbidden_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&server)
        .await;

    let err = fetcher(*server.address(), small_pages(), fast_retry(1))
        .fetch(Filters::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AppError::UnexpectedStatus { status: 403, .. }),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_not_found_reports_page_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            "<html><head><title>Page Not Found. | Catalog</title></head></html>",
        ))
        .mount(&server)
        .await;

    let err = fetcher(*server.address(), small_pages(), fast_retry(1))
        .fetch(Filters::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Page Not Found."), "{}", err);
}

#[tokio::test]
async fn test_rejected_filter_yields_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .and(query_param("tag", "missing"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"tag": ["Select a valid choice."]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(*server.address(), small_pages(), fast_retry(1))
        .fetch(Filters::new().with("tag", "missing"))
        .await
        .unwrap();

    assert!(result.data.is_empty());
    assert_eq!(result.metadata.filters_rejected, 1);
    assert!(result.metadata.is_degraded());
}

#[tokio::test]
async fn test_slow_page_is_retried_then_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(1, [1]))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let result = fetcher(*server.address(), small_pages(), fast_retry(2))
        .fetch(Filters::new())
        .await
        .unwrap();

    assert!(result.data.is_empty());
    assert_eq!(result.metadata.retries_exhausted, 1);
}

#[tokio::test]
async fn test_refused_connection_is_fatal() {
    let address = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let err = fetcher(address, small_pages(), fast_retry(3))
        .fetch(Filters::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AppError::Connection { .. }),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_count_sends_brief_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICES_PATH))
        .and(query_param("brief", "1"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(42, [1])))
        .expect(1)
        .mount(&server)
        .await;

    let count = fetcher(*server.address(), small_pages(), fast_retry(1))
        .count(Filters::new())
        .await
        .unwrap();

    assert_eq!(count, 42);
}
