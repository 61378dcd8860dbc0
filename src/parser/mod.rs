//! HTML parsing and record extraction
//!
//! Every page kind is handled by an [`Extractor`]. Card layouts are read from
//! the DOM by a primary extractor; when that under-performs, a
//! [`TwoStageExtractor`] re-derives the records from the flattened page text.
//!
//! `scraper::Html` is not `Send`, so a [`Page`] lives only inside synchronous
//! extraction code and is dropped before the crawl loop awaits again.

pub mod detail;
pub mod fields;
pub mod listing;
pub mod pagination;
pub mod review;
pub mod selectors;
pub mod text;
pub mod usage;

pub use detail::{extract_detail, DetailInfo};
pub use fields::FieldTable;
pub use listing::ListingExtractor;
pub use pagination::has_next_page;
pub use review::{review_extractor, ReviewCardExtractor, ReviewTextExtractor};
pub use usage::{usage_extractor, UsageCardExtractor, UsageTextExtractor};

use scraper::{ElementRef, Html};
use std::cell::OnceCell;
use tracing::debug;

use selectors::MAIN;

/// Elements whose text never reaches the flattened page text
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "template", "noscript"];

/// A parsed HTML page with lazily flattened text
pub struct Page {
    document: Html,
    lines: OnceCell<Vec<String>>,
}

impl Page {
    /// Parse a full HTML document
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            lines: OnceCell::new(),
        }
    }

    /// Parsed document
    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Non-empty trimmed text lines of the page, preferring `<main>`
    pub fn lines(&self) -> &[String] {
        self.lines.get_or_init(|| {
            let root = self
                .document
                .select(&MAIN)
                .next()
                .unwrap_or_else(|| self.document.root_element());
            flatten_lines(root)
        })
    }

    /// Whole flattened text, one line per text node
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

/// Flatten the text below `root` into trimmed, non-empty lines
pub fn flatten_lines(root: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    collect_lines(root, &mut lines);
    lines
}

fn collect_lines(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !SKIPPED_ELEMENTS.contains(&child_element.value().name()) {
                collect_lines(child_element, lines);
            }
        } else if let Some(text) = child.value().as_text() {
            let text: &str = text;
            lines.extend(
                text.split('\n')
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }
    }
}

/// Strategy turning a page into records
pub trait Extractor {
    /// Record type produced
    type Record;

    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Extract all records of the page in document order
    fn extract(&self, page: &Page) -> Vec<Self::Record>;
}

/// Primary extractor with a text fallback selected by a record-count threshold
///
/// When the primary strategy yields fewer than `min_records` records, the
/// fallback runs and its output replaces the primary output. An empty
/// fallback result keeps whatever the primary strategy found.
pub struct TwoStageExtractor<P, F> {
    primary: P,
    fallback: F,
    min_records: usize,
}

impl<P, F> TwoStageExtractor<P, F>
where
    P: Extractor,
    F: Extractor<Record = P::Record>,
{
    /// Combine two strategies
    pub fn new(primary: P, fallback: F, min_records: usize) -> Self {
        Self {
            primary,
            fallback,
            min_records,
        }
    }

    /// Record count below which the fallback runs
    pub fn min_records(&self) -> usize {
        self.min_records
    }
}

impl<P, F> Extractor for TwoStageExtractor<P, F>
where
    P: Extractor,
    F: Extractor<Record = P::Record>,
{
    type Record = P::Record;

    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn extract(&self, page: &Page) -> Vec<Self::Record> {
        let records = self.primary.extract(page);
        if records.len() >= self.min_records {
            return records;
        }

        let fallback = self.fallback.extract(page);
        debug!(
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            primary_count = records.len(),
            fallback_count = fallback.len(),
            threshold = self.min_records,
            "Primary extraction below threshold, using fallback"
        );

        if fallback.is_empty() {
            records
        } else {
            fallback
        }
    }
}
