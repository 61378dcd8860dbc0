//! REST and SSE handlers of the trigger API

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{stream, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::crawler::{self, ProgressEvent, ProgressReporter, Target};
use crate::geocode::{Geocoder, NominatimGeocoder};

use super::AppState;

// ============================================================================
// API Types
// ============================================================================

/// Service banner
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Simple error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// `POST /run-scrape` query
#[derive(Debug, Default, Deserialize)]
pub struct RunScrapeQuery {
    /// `status` (default), `reviews` or `usage`
    pub target: Option<String>,
}

/// `POST /geocode` body
#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

/// `POST /geocode` answer
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeocodeResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/run-scrape", post(run_scrape))
        .route("/geocode", post(geocode))
        .with_state(state)
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: String::from("EV Charger Data Collection API"),
        status: String::from("running"),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("healthy"),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn geocode(
    State(state): State<AppState>,
    Json(request): Json<GeocodeRequest>,
) -> Json<GeocodeResponse> {
    let address = request.address.trim();
    if address.is_empty() {
        return Json(GeocodeResponse::failure("住所が指定されていません"));
    }

    let geocoder = match NominatimGeocoder::new(&state.config.geocoding) {
        Ok(geocoder) => geocoder,
        Err(e) => return Json(GeocodeResponse::failure(e.to_string())),
    };

    let response = match geocoder.geocode(address).await {
        Ok(Some(location)) => GeocodeResponse {
            success: true,
            lat: Some(location.latitude),
            lon: Some(location.longitude),
            display_name: Some(location.display_name.unwrap_or_else(|| address.to_string())),
            error: None,
        },
        Ok(None) => GeocodeResponse::failure("住所が見つかりませんでした"),
        Err(e) => {
            tracing::error!(address, error = %e, "Geocoding failed");
            GeocodeResponse::failure(e.to_string())
        }
    };

    Json(response)
}

// ============================================================================
// Scrape trigger
// ============================================================================

/// Aborts the crawl task when the response stream is dropped
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct StreamState {
    rx: mpsc::Receiver<ProgressEvent>,
    _task: AbortOnDrop,
    idle_timeout: Duration,
    finished: bool,
}

fn done_event(code: i32) -> Event {
    Event::default().event("done").data(code.to_string())
}

fn to_sse(event: &ProgressEvent) -> Event {
    match event {
        ProgressEvent::Done(code) => done_event(*code),
        // Carriage returns cannot travel in an SSE data field
        other => Event::default().data(other.data().replace('\r', "")),
    }
}

/// SSE stream draining the progress channel until `done` or idle timeout
fn progress_stream(
    rx: mpsc::Receiver<ProgressEvent>,
    task: AbortOnDrop,
    idle_timeout: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let state = StreamState {
        rx,
        _task: task,
        idle_timeout,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        let event = match tokio::time::timeout(state.idle_timeout, state.rx.recv()).await {
            Ok(Some(event)) => {
                state.finished = event.is_terminal();
                to_sse(&event)
            }
            Ok(None) => {
                tracing::warn!("Crawl task ended without a terminal event");
                state.finished = true;
                done_event(1)
            }
            Err(_) => {
                tracing::warn!(
                    idle_secs = state.idle_timeout.as_secs(),
                    "No progress within idle timeout, closing stream"
                );
                state.finished = true;
                done_event(1)
            }
        };

        Some((Ok(event), state))
    })
}

async fn run_scrape(
    State(state): State<AppState>,
    Query(query): Query<RunScrapeQuery>,
) -> impl IntoResponse {
    let target = match query.target.as_deref().map(str::parse::<Target>) {
        None => Target::Status,
        Some(Ok(target)) => target,
        Some(Err(e)) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e))).into_response();
        }
    };

    tracing::info!(%target, "Scrape triggered");

    let config = Arc::clone(&state.config);
    let (reporter, rx) = ProgressReporter::channel(config.server.progress_buffer);
    let idle_timeout = Duration::from_secs(config.server.idle_timeout_secs);

    let handle = tokio::spawn(async move {
        reporter.log("スクレイピングを開始します...").await;
        let result = crawler::run(target, &config, &reporter)
            .await
            .map_err(|e| format!("{e:#}"));
        reporter.finish(&result).await;
    });

    let stream = progress_stream(rx, AbortOnDrop(handle), idle_timeout);
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
