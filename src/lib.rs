//! ev_scraper - EV charger status, review and usage scraper
//!
//! Collects fault and maintenance notices, user reviews and usage records
//! for EV chargers from ev.gogo.gs, classifies review text by charging
//! result and writes CSV/JSON files for a dashboard.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Page fetching, pagination loop and the per-target runs
//! - [`parser`] - Card, detail page and text-fallback extraction
//! - [`classifier`] - Ordered-rule charging-result classification
//! - [`geocode`] - Address to coordinate lookups
//! - [`models`] - Record types and dedup keys
//! - [`storage`] - Deduplication and CSV/JSON output
//! - [`server`] - Scrape trigger API with progress streaming
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use ev_scraper::config::Config;
//! use ev_scraper::crawler::{run, ProgressReporter, Target};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let summary = run(Target::Reviews, &config, &ProgressReporter::silent()).await?;
//!     println!("{} records", summary.records);
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod crawler;
pub mod error;
pub mod geocode;
pub mod models;
pub mod parser;
pub mod server;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::classifier::{classify, Classifier};
    pub use crate::config::Config;
    pub use crate::crawler::{run, PageFetcher, ProgressEvent, ProgressReporter, Target};
    pub use crate::error::{Error, Result};
    pub use crate::models::{ChargingResult, CrawlRecord, ListingRecord, ReviewRecord, UsageRecord};
    pub use crate::storage::{write_json, write_records, Deduplicator};
}

// Direct re-exports for convenience
pub use models::{ChargingResult, ListingRecord, ReviewRecord, StatusType, UsageRecord};
