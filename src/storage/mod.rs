//! Crawl output: deduplication and CSV/JSON files
//!
//! Output files are written once per crawl, after all records are in memory.

pub mod dedup;
pub mod export;
pub mod tally;

pub use dedup::Deduplicator;
pub use export::{
    read_records, read_table, write_csv, write_json, write_records, write_table, CsvTable,
    UTF8_BOM,
};
pub use tally::{tally_column, ColumnTally, EMPTY_VALUE_LABEL};

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::utils::timestamped_file_name;

/// File name prefix of review crawls
pub const REVIEW_FILE_PREFIX: &str = "gogoev_reviews";

/// File name prefix of usage crawls
pub const USAGE_FILE_PREFIX: &str = "gogoev_using";

/// `{dir}/{prefix}_{YYYYmmdd_HHMMSS}.csv`
pub fn timestamped_csv(dir: &Path, prefix: &str, now: DateTime<Local>) -> PathBuf {
    dir.join(timestamped_file_name(prefix, "csv", now))
}

/// Sibling path with `suffix` appended to the file stem
///
/// `reviews.csv` with `_failed` becomes `reviews_failed.csv`.
pub fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(name)
}
