//! Error types for the scraper
//!
//! This module defines the domain error types used throughout the application.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded ({attempts} attempts): {last}")]
    MaxRetriesExceeded { attempts: u32, last: String },

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// A configured value cannot be sent as a request header
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

/// Errors that can occur while extracting one record
#[derive(Error, Debug)]
pub enum ParseError {
    /// A link could not be resolved against the site base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A CSV input lacks a column the command needs
    #[error("列「{0}」が見つかりません")]
    MissingColumn(String),
}

/// Errors raised by the geocoding collaborator
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// HTTP failure talking to the geocoding service
    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Geocoding service returned status {0}")]
    Status(u16),

    /// Coordinates in the response were not numeric
    #[error("Invalid coordinate in response: {0}")]
    InvalidCoordinate(String),
}

/// Errors raised while loading a classifier rule table
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// A pattern failed to compile
    #[error("Invalid pattern in rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// A label name is not one of the four results
    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    /// The rule file could not be read
    #[error("Failed to read rule file: {0}")]
    Io(#[from] std::io::Error),

    /// The rule file is not valid TOML
    #[error("Failed to parse rule file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// General crawler errors
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// Output could not be written
    #[error("Failed to write output {path}: {reason}")]
    Output { path: String, reason: String },
}

impl FetchError {
    /// Whether another attempt may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status(_) | Self::Timeout | Self::MaxRetriesExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_retries_message() {
        let err = FetchError::MaxRetriesExceeded {
            attempts: 3,
            last: "Unexpected status: 503".to_string(),
        };
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_unknown_label_message() {
        let err = ClassifierError::UnknownLabel("maybe".into());
        assert_eq!(err.to_string(), "Unknown label 'maybe'");
    }

    #[test]
    fn test_recoverable() {
        assert!(FetchError::Timeout.is_recoverable());
        assert!(FetchError::Status(500).is_recoverable());
        assert!(!FetchError::Decode("bad".into()).is_recoverable());
    }
}
