//! Crawl progress reporting
//!
//! Progress lines are traced and, when a channel is attached, forwarded to
//! the server-sent event stream of the trigger endpoint.

use tokio::sync::mpsc;
use tracing::{info, warn};

/// One progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Progress line
    Log(String),
    /// Run finished successfully
    Success(String),
    /// Run failed
    Error(String),
    /// Terminal event carrying the exit status (0 success, 1 failure)
    Done(i32),
}

impl ProgressEvent {
    /// Text of the `data:` field
    pub fn data(&self) -> String {
        match self {
            Self::Log(line) | Self::Success(line) => line.clone(),
            Self::Error(message) => format!("エラー: {message}"),
            Self::Done(code) => code.to_string(),
        }
    }

    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Progress sink handed to a crawl
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressReporter {
    /// Reporter that only traces
    pub fn silent() -> Self {
        Self { tx: None }
    }

    /// Reporter forwarding to a bounded channel of `buffer` events
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    async fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // A closed receiver means the client went away; the crawl task is
            // aborted shortly after.
            let _ = tx.send(event).await;
        }
    }

    /// Report a progress line
    pub async fn log(&self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "ev_scraper::progress", "{line}");
        self.send(ProgressEvent::Log(line)).await;
    }

    /// Report a non-fatal problem
    pub async fn warn(&self, line: impl Into<String>) {
        let line = line.into();
        warn!(target: "ev_scraper::progress", "{line}");
        self.send(ProgressEvent::Log(line)).await;
    }

    /// Report the end of a run, followed by the terminal `Done` event
    pub async fn finish<T, E: std::fmt::Display>(&self, result: &Result<T, E>) {
        match result {
            Ok(_) => {
                let message = "スクレイピングが正常に完了しました";
                info!(target: "ev_scraper::progress", "{message}");
                self.send(ProgressEvent::Success(message.to_string())).await;
                self.send(ProgressEvent::Done(0)).await;
            }
            Err(e) => {
                warn!(target: "ev_scraper::progress", error = %e, "Run failed");
                self.send(ProgressEvent::Error(e.to_string())).await;
                self.send(ProgressEvent::Done(1)).await;
            }
        }
    }
}
