//! Retry utilities for resilient operations
//!
//! Fixed-backoff retry shared by the page fetcher and the geocoder. The target
//! site is polite-crawled, so the pause between attempts is constant rather
//! than exponential.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts (first try included)
    pub max_attempts: u32,

    /// Pause between two attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Outcome of a retried operation that never succeeded
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Number of attempts made
    pub attempts: u32,

    /// Error of the final attempt
    pub last_error: E,
}

/// Execute an operation with fixed-backoff retry
///
/// `should_retry` decides whether a failure is worth another attempt; a
/// non-retryable error is returned after the first attempt.
///
/// # Example
///
/// ```no_run
/// use ev_scraper::utils::retry::{with_retry, RetryConfig};
///
/// # async fn demo() {
/// let config = RetryConfig::default();
/// let result = with_retry(&config, || async { Ok::<_, String>(42) }, |_| true).await;
/// assert_eq!(result.ok(), Some(42));
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation: F,
    should_retry: P,
) -> Result<T, RetryExhausted<E>>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= max_attempts || !should_retry(&e) {
                    warn!(attempt, max_attempts, error = %e, "Giving up");
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }

                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = config.delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(config.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = with_retry(&fast(3), || async { Ok::<_, String>(42) }, |_| true).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry(
            &fast(3),
            move || {
                let attempts = Arc::clone(&attempts_clone);
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        return Err("Simulated failure".to_string());
                    }
                    Ok(42)
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let result: Result<(), _> = with_retry(
            &fast(3),
            || async { Err::<(), _>("Permanent failure".to_string()) },
            |_| true,
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert!(err.last_error.contains("Permanent failure"));
    }

    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<(), _> = with_retry(
            &fast(5),
            move || {
                let attempts = Arc::clone(&attempts_clone);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("validation error".to_string())
                }
            },
            |e| !e.contains("validation"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryConfig::new(0, Duration::ZERO).max_attempts, 1);
    }
}
