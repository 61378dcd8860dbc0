//! Trigger API server
//!
//! Exposes a small HTTP API for the dashboard: health endpoints, a one-off
//! geocoding lookup and `POST /run-scrape`, which runs a crawl and streams
//! its progress as server-sent events.

pub mod api;

use std::future::Future;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub use api::create_router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration handed to every triggered crawl
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Router with CORS and request tracing applied
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);
    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server bound to the configured host and port
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Create a server
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(format!("{e:#}")))?;
        Ok(Self {
            state: AppState::new(config),
        })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    fn bind_address(&self) -> String {
        let server = &self.state.config.server;
        format!("{}:{}", server.host, server.port)
    }

    /// Serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = self.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        let shown = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or(addr);
        tracing::info!(addr = %shown, "API server listening");

        axum::serve(listener, build_router(self.state()))
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("API server shutdown complete");
        Ok(())
    }

    /// Serve until Ctrl+C
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(shutdown_signal()).await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
