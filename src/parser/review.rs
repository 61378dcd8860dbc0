//! Review listing pages (`/review/{prefecture}`)

use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

use super::selectors::{AUTHOR_LINK, BOLD_LINK_LOOSE, CARD, HEADING, RULE, SMALL_TEXT, SPAN};
use super::text::{
    before_slash, compact_text, has_region_marker, is_numeric_line, joined_text,
    looks_like_address,
};
use super::{Extractor, Page, TwoStageExtractor};
use crate::models::{CrawlRecord, ReviewRecord};

const DATE_MARKER: &str = "投稿日時";
const AUTHOR_MARKER: &str = "投稿者";

lazy_static! {
    static ref DATE_LABEL: Regex = Regex::new(r"投稿日時\s*").expect("Invalid regex pattern");
    static ref DATED_LINE: Regex =
        Regex::new(r"投稿日時\s*(\d{4}年\d{1,2}月\d{1,2}日[^投稿者]*)").expect("Invalid regex pattern");
    static ref AUTHOR_LINE: Regex = Regex::new(r"投稿者\s*(.+)").expect("Invalid regex pattern");
}

/// Review extractor with the text fallback below `min_records` card records
pub fn review_extractor(
    min_records: usize,
    window: usize,
    chrome_tokens: Vec<String>,
) -> TwoStageExtractor<ReviewCardExtractor, ReviewTextExtractor> {
    TwoStageExtractor::new(
        ReviewCardExtractor,
        ReviewTextExtractor::new(window, chrome_tokens),
        min_records,
    )
}

/// Reads review cards from the DOM
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewCardExtractor;

impl ReviewCardExtractor {
    /// Extract one card; `None` when it has no name, address or body
    pub fn extract_card(&self, card: ElementRef<'_>) -> Option<ReviewRecord> {
        let mut record = ReviewRecord::default();

        let name_element = card
            .select(&HEADING)
            .next()
            .or_else(|| card.select(&BOLD_LINK_LOOSE).next());
        if let Some(el) = name_element {
            record.charger_name = before_slash(&compact_text(el)).to_string();
        }

        let address_element = card.select(&SMALL_TEXT).next();
        if let Some(el) = address_element {
            let address = compact_text(el);
            if has_region_marker(&address) {
                record.charger_address = address;
            }
        }

        let body_anchor = match card.select(&RULE).next() {
            Some(hr) => Some(hr),
            None => address_element,
        };
        if let Some(body) = body_anchor.and_then(next_element_sibling) {
            record.content = joined_text(body);
        }

        let date_span = card
            .select(&SPAN)
            .find(|span| compact_text(*span).contains(DATE_MARKER));
        if let Some(span) = date_span {
            let paragraph = span
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "p");
            if let Some(p) = paragraph {
                record.posted_at = DATE_LABEL.replace_all(&compact_text(p), "").trim().to_string();
            }
        }

        if let Some(author) = card.select(&AUTHOR_LINK).next() {
            record.author = compact_text(author);
        }

        record.is_meaningful().then_some(record)
    }
}

fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

impl Extractor for ReviewCardExtractor {
    type Record = ReviewRecord;

    fn name(&self) -> &'static str {
        "review-cards"
    }

    fn extract(&self, page: &Page) -> Vec<ReviewRecord> {
        page.document()
            .select(&CARD)
            .filter_map(|card| self.extract_card(card))
            .collect()
    }
}

/// Re-derives reviews from the flattened page text
#[derive(Debug, Clone)]
pub struct ReviewTextExtractor {
    window: usize,
    chrome_tokens: Vec<String>,
}

impl ReviewTextExtractor {
    /// Create a text extractor with a lookahead of `window` lines
    pub fn new(window: usize, chrome_tokens: Vec<String>) -> Self {
        Self {
            window,
            chrome_tokens,
        }
    }

    /// Scan the lines of a page
    pub fn extract_lines(&self, lines: &[String]) -> Vec<ReviewRecord> {
        let mut records = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].as_str();
            if !is_name_line(line) {
                i += 1;
                continue;
            }

            let (record, next) = self.read_record(lines, i);
            if record.is_meaningful() {
                records.push(record);
            }
            i = next;
        }

        records
    }

    /// Read one record starting at the name line `start`; returns the record
    /// and the index where scanning resumes
    fn read_record(&self, lines: &[String], start: usize) -> (ReviewRecord, usize) {
        let mut record = ReviewRecord {
            charger_name: before_slash(&lines[start]).to_string(),
            ..Default::default()
        };
        let mut body = Vec::new();
        let mut found_address = false;

        let end = lines.len().min(start + self.window);
        let mut j = start + 1;

        while j < end {
            let line = lines[j].as_str();
            j += 1;

            if !found_address && looks_like_address(line) {
                record.charger_address = line.to_string();
                found_address = true;
                continue;
            }

            if line.contains(DATE_MARKER) {
                record.posted_at = match DATED_LINE.captures(line).and_then(|c| c.get(1)) {
                    Some(m) => m.as_str().trim().to_string(),
                    None => DATE_LABEL.replace_all(line, "").trim().to_string(),
                };
                if line.contains(AUTHOR_MARKER) {
                    record.author = author_of(line);
                    break;
                }
                continue;
            }

            if line.contains(AUTHOR_MARKER) {
                record.author = author_of(line);
                break;
            }

            if found_address && self.is_body_line(line, &record) {
                body.push(line);
            }
        }

        record.content = body.join("\n").trim().to_string();
        (record, j)
    }

    fn is_body_line(&self, line: &str, record: &ReviewRecord) -> bool {
        line != record.charger_name
            && line != record.charger_address
            && !is_numeric_line(line)
            && !self.chrome_tokens.iter().any(|t| line.contains(t.as_str()))
    }
}

/// A line that opens a record: `name / operator`, not a URL
fn is_name_line(line: &str) -> bool {
    line.contains('/')
        && line.chars().count() > 5
        && !line.starts_with("http")
        && !line.starts_with("www")
}

/// Author handle following the `投稿者` marker
fn author_of(line: &str) -> String {
    let after_marker = line
        .find(AUTHOR_MARKER)
        .map(|idx| &line[idx..])
        .unwrap_or(line);

    AUTHOR_LINE
        .captures(after_marker)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

impl Extractor for ReviewTextExtractor {
    type Record = ReviewRecord;

    fn name(&self) -> &'static str {
        "review-text"
    }

    fn extract(&self, page: &Page) -> Vec<ReviewRecord> {
        self.extract_lines(page.lines())
    }
}
