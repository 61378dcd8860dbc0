//! Integration tests for PageFetcher using wiremock
//!
//! These tests validate retry, status and encoding handling against mock
//! servers.

use ev_scraper::crawler::fetcher::PageFetcher;
use ev_scraper::error::FetchError;
use ev_scraper::utils::retry::RetryConfig;
use std::time::Duration;
use wiremock::matchers::{header, headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(max_attempts: u32) -> PageFetcher {
    PageFetcher::with_settings(
        "Mozilla/5.0 (test)",
        Duration::from_secs(5),
        RetryConfig::new(max_attempts, Duration::from_millis(1)),
        Duration::ZERO,
    )
    .unwrap()
}

/// Test successful fetch from mock server
#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    let html = "<html><body><h1>充電スタンド一覧</h1></body></html>";

    Mock::given(method("GET"))
        .and(path("/review/13"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let result = fetcher(3)
        .fetch(&format!("{}/review/13", mock_server.uri()))
        .await;

    assert!(result.is_ok(), "Fetch should succeed: {:?}", result.err());
    assert!(result.unwrap().contains("充電スタンド一覧"));
}

/// Test that browser-like headers are sent
#[tokio::test]
async fn test_sends_site_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accident"))
        .and(header("user-agent", "Mozilla/5.0 (test)"))
        // Comma-separated values are matched as a list
        .and(headers("accept-language", vec!["ja", "en-US;q=0.9", "en;q=0.8"]))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = fetcher(1)
        .fetch(&format!("{}/accident", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

/// Test that server errors trigger retries
#[tokio::test]
async fn test_server_error_retry() {
    let mock_server = MockServer::start().await;

    // Return 500 twice, then succeed
    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;

    let result = fetcher(3)
        .fetch(&format!("{}/test", mock_server.uri()))
        .await;

    assert_eq!(result.unwrap(), "OK");
}

/// Every non-2xx status is retried until attempts run out
#[tokio::test]
async fn test_not_found_exhausts_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = fetcher(3)
        .fetch(&format!("{}/notfound", mock_server.uri()))
        .await;

    match result {
        Err(FetchError::MaxRetriesExceeded { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(last.contains("404"), "last error: {last}");
        }
        other => panic!("expected MaxRetriesExceeded, got {other:?}"),
    }
}

/// Test Shift_JIS body without a charset in Content-Type
#[tokio::test]
async fn test_shift_jis_decoding() {
    let mock_server = MockServer::start().await;
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("<html><body>急速充電器が故障中です</body></html>");

    Mock::given(method("GET"))
        .and(path("/sjis"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(bytes.into_owned(), "text/html"),
        )
        .mount(&mock_server)
        .await;

    let body = fetcher(1)
        .fetch(&format!("{}/sjis", mock_server.uri()))
        .await
        .unwrap();
    assert!(body.contains("急速充電器が故障中です"));
}

/// Unreachable host fails after the configured attempts
#[tokio::test]
async fn test_connection_refused() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    drop(mock_server);

    let result = fetcher(2).fetch(&format!("{uri}/gone")).await;
    assert!(matches!(
        result,
        Err(FetchError::MaxRetriesExceeded { attempts: 2, .. })
    ));
}
