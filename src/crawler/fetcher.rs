//! HTTP fetcher with request pacing and Japanese encoding support
//!
//! This module provides the page fetcher for ev.gogo.gs with features
//! including:
//! - A fixed browser-like User-Agent
//! - Request pacing with governor (minimum interval between requests)
//! - Fixed-delay retry on timeouts, connection errors and non-2xx statuses
//! - Shift_JIS / EUC-JP detection and conversion

use crate::config::CrawlerConfig;
use crate::crawler::headers::build_site_headers;
use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry, RetryConfig};
use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header::HeaderMap, Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Page fetcher
///
/// Cloning shares the HTTP client (and its cookie store) and the pacing
/// state.
#[derive(Clone)]
pub struct PageFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Headers sent with every request
    headers: HeaderMap,

    /// Minimum interval between two requests; `None` disables pacing
    rate_limiter: Option<Arc<DirectLimiter>>,

    /// Attempts and pause between them
    retry: RetryConfig,
}

impl PageFetcher {
    /// Create a fetcher from the crawler settings, paced at `page_delay_ms`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        Self::with_settings(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
            RetryConfig::new(config.max_attempts, Duration::from_millis(config.retry_delay_ms)),
            Duration::from_millis(config.page_delay_ms),
        )
    }

    /// Create a fetcher with explicit settings
    ///
    /// # Arguments
    ///
    /// * `user_agent` - User-Agent header value
    /// * `timeout` - Per-request timeout
    /// * `retry` - Attempts and the pause between them
    /// * `min_interval` - Minimum time between requests (zero disables pacing)
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_settings(
        user_agent: &str,
        timeout: Duration,
        retry: RetryConfig,
        min_interval: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            headers: build_site_headers(user_agent)?,
            rate_limiter: Self::limiter(min_interval),
            retry,
        })
    }

    /// Same client and headers with a different pacing interval
    ///
    /// Used for detail lookups, which are paced independently of list pages.
    pub fn with_interval(&self, min_interval: Duration) -> Self {
        Self {
            client: self.client.clone(),
            headers: self.headers.clone(),
            rate_limiter: Self::limiter(min_interval),
            retry: self.retry.clone(),
        }
    }

    fn limiter(min_interval: Duration) -> Option<Arc<DirectLimiter>> {
        Quota::with_period(min_interval).map(|quota| Arc::new(RateLimiter::direct(quota)))
    }

    /// Fetch a page as text
    ///
    /// Waits for the pacing interval, then makes up to `max_attempts`
    /// attempts with a fixed pause between them.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MaxRetriesExceeded` when every attempt failed,
    /// or `FetchError::Decode` when the body is in no supported encoding
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        with_retry(&self.retry, || self.fetch_once(url), FetchError::is_recoverable)
            .await
            .map_err(|exhausted| match exhausted.last_error {
                FetchError::Decode(reason) => FetchError::Decode(reason),
                last => {
                    warn!(url, attempts = exhausted.attempts, error = %last, "Fetch failed");
                    FetchError::MaxRetriesExceeded {
                        attempts: exhausted.attempts,
                        last: last.to_string(),
                    }
                }
            })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Self::decode_response(response).await
    }

    /// Decode response body using its declared charset
    async fn decode_response(response: Response) -> Result<String, FetchError> {
        // Get Content-Type header and convert to owned String before consuming response
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await?;

        Self::decode_bytes(&bytes, &content_type)
    }

    /// Decode bytes to a string with encoding detection
    ///
    /// This method tries, in order:
    /// 1. The charset declared in the Content-Type header
    /// 2. UTF-8
    /// 3. A `<meta charset>` declaration in the first 1024 bytes
    /// 4. Shift_JIS, then EUC-JP
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Decode` if decoding fails with all strategies
    pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
        if let Some(encoding) = charset_of(content_type) {
            return decode_strict(bytes, encoding);
        }

        if let Ok(text) = decode_strict(bytes, UTF_8) {
            return Ok(text);
        }

        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]).to_lowercase();
        if let Some(encoding) = charset_of(&head) {
            if let Ok(text) = decode_strict(bytes, encoding) {
                return Ok(text);
            }
        }

        decode_strict(bytes, SHIFT_JIS)
            .or_else(|_| decode_strict(bytes, EUC_JP))
            .map_err(|_| {
                FetchError::Decode("Failed to decode content as UTF-8, Shift_JIS or EUC-JP".into())
            })
    }
}

/// Encoding named by a `charset=` parameter
fn charset_of(text: &str) -> Option<&'static Encoding> {
    let lower = text.to_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let label: String = lower[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    Encoding::for_label(label.as_bytes())
}

fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Result<String, FetchError> {
    let (cow, _encoding, had_errors) = encoding.decode(bytes);

    if had_errors {
        return Err(FetchError::Decode(format!("{} decoding errors", encoding.name())));
    }

    Ok(cow.into_owned())
}
