//! Unified error handling for the ev_scraper crate
//!
//! Domain errors live in [`crate::utils::error`]; [`Error`] wraps them so
//! library operations can share one `Result` type. The binary and the crawl
//! entry point add context on top with `anyhow`.

use std::io;
use thiserror::Error;

pub use crate::utils::error::{
    ClassifierError, CrawlerError, FetchError, GeocodeError, ParseError,
};

/// Unified error type for the ev_scraper crate
#[derive(Error, Debug)]
pub enum Error {
    /// Crawl output errors
    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlerError),

    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Classifier rule table errors
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Geocoding errors
    #[error("Geocode error: {0}")]
    Geocode(#[from] GeocodeError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
