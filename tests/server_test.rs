//! Trigger API tests driven through the router with tower's ServiceExt

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ev_scraper::config::Config;
use ev_scraper::server::{build_router, AppState};

use common::{page, review_card, test_config};

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_root_and_health() {
    let app = build_router(AppState::new(Config::default()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["message"], "EV Charger Data Collection API");
    assert_eq!(json["status"], "running");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_target_is_rejected() {
    let app = build_router(AppState::new(Config::default()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/run-scrape?target=news")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_run_scrape_streams_progress_until_done() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/13"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page(
                    &review_card("日産 東雲店", "東京都江東区東雲1-9-41", "充電できました"),
                    false,
                ))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&site)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(test_config(&site.uri(), dir.path())));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/run-scrape?target=reviews")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream")));

    let body = body_string(response).await;
    assert!(body.contains("data: スクレイピングを開始します..."), "body: {body}");
    assert!(body.contains("スクレイピングが正常に完了しました"));
    assert!(body.contains("event: done\ndata: 0"));
}

#[tokio::test]
async fn test_run_scrape_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config("http://127.0.0.1:1", dir.path());
    config.crawler.max_attempts = 1;
    // A regular file where the dashboard directory should be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    config.output.dashboard_json = blocker.join("data.json");
    config.geocoding.enabled = false;

    let app = build_router(AppState::new(config));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/run-scrape")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_string(response).await;
    assert!(body.contains("data: エラー: "), "body: {body}");
    assert!(body.contains("event: done\ndata: 1"));
}

#[tokio::test]
async fn test_geocode_not_found() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&site)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(test_config(&site.uri(), dir.path())));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/geocode")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"address":"存在しない住所"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "住所が見つかりませんでした");
}

#[tokio::test]
async fn test_geocode_found() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"lat": "35.6812", "lon": "139.7671", "display_name": "東京駅, 丸の内"}
        ])))
        .mount(&site)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(test_config(&site.uri(), dir.path())));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/geocode")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"address":"東京都千代田区丸の内1-9-1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["lat"], 35.6812);
    assert_eq!(json["display_name"], "東京駅, 丸の内");
}
