//! Paged crawl loop
//!
//! ```text
//! ┌─────────┐     ┌───────────┐     ┌──────────────┐     ┌──────────┐
//! │ Fetcher │────▶│ Extractor │────▶│ Deduplicator │────▶│ Records  │
//! └─────────┘     └───────────┘     └──────────────┘     └──────────┘
//!      ▲                │
//!      └── next page? ──┘
//! ```
//!
//! Pages are processed strictly one at a time. The loop stops on the first
//! page that yields no records, when the page cap is reached, when the page
//! shows no pagination control, or when a page cannot be fetched.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::progress::ProgressReporter;
use crate::models::CrawlRecord;
use crate::parser::{has_next_page, Extractor, Page};
use crate::storage::Deduplicator;

/// Records found on one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    /// 1-based page number
    pub page: u32,

    /// Records extracted from the page
    pub extracted: usize,

    /// Records kept after deduplication
    pub added: usize,
}

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page yielded no records
    EmptyPage,
    /// The page cap was reached
    MaxPages,
    /// The last page had no pagination control
    NoNextPage,
    /// A page could not be fetched
    FetchFailed,
}

/// Result of a paged crawl
#[derive(Debug, Clone)]
pub struct CrawlOutcome<R> {
    /// Distinct records in first-seen order
    pub records: Vec<R>,

    /// Per-page counts
    pub pages: Vec<PageSummary>,

    /// Why the loop ended
    pub stop_reason: StopReason,
}

impl<R> CrawlOutcome<R> {
    /// Records dropped as duplicates
    pub fn duplicates(&self) -> usize {
        self.pages.iter().map(|p| p.extracted - p.added).sum()
    }
}

/// URL of page `page` of a listing
///
/// Page 1 is the bare listing URL; later pages use the `page` query parameter.
pub fn page_url(base: &str, page: u32) -> String {
    if page <= 1 {
        return base.to_string();
    }
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}page={page}")
}

/// Extract records and the pagination signal from one HTML document
///
/// Kept synchronous: the parsed document must not live across an await.
fn extract_page<E: Extractor>(extractor: &E, html: &str) -> (Vec<E::Record>, bool) {
    let page = Page::parse(html);
    (extractor.extract(&page), has_next_page(&page))
}

/// Sequential crawler over the pages of one listing
pub struct PagedCrawler<'a> {
    fetcher: &'a PageFetcher,
    reporter: &'a ProgressReporter,
    max_pages: u32,
}

impl<'a> PagedCrawler<'a> {
    /// Create a crawler
    ///
    /// `max_pages` caps the number of pages (0 = unlimited).
    pub fn new(fetcher: &'a PageFetcher, reporter: &'a ProgressReporter, max_pages: u32) -> Self {
        Self {
            fetcher,
            reporter,
            max_pages,
        }
    }

    /// Crawl `base_url` page by page
    ///
    /// Fetch failures end the crawl with what was collected so far; they are
    /// reported, not returned.
    pub async fn crawl<E>(
        &self,
        base_url: &str,
        extractor: &E,
        dedup: &mut Deduplicator,
    ) -> CrawlOutcome<E::Record>
    where
        E: Extractor + Sync,
        E::Record: CrawlRecord,
    {
        let mut records = Vec::new();
        let mut pages = Vec::new();
        let mut page = 1;

        let stop_reason = loop {
            // Check if we've reached max pages (0 means unlimited)
            if self.max_pages > 0 && page > self.max_pages {
                tracing::debug!(page, max_pages = self.max_pages, "Reached maximum pages limit");
                self.reporter
                    .log(format!("{}ページ目まで取得しました。", self.max_pages))
                    .await;
                break StopReason::MaxPages;
            }

            let url = page_url(base_url, page);
            self.reporter.log(format!("ページ {page} を取得中: {url}")).await;

            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    self.reporter
                        .warn(format!("エラー: {url} の取得に失敗しました: {e}"))
                        .await;
                    break StopReason::FetchFailed;
                }
            };

            let (extracted, has_more) = extract_page(extractor, &html);

            if extracted.is_empty() {
                pages.push(PageSummary {
                    page,
                    extracted: 0,
                    added: 0,
                });
                self.reporter
                    .log(format!("ページ {page} にデータがありません。終了します。"))
                    .await;
                break StopReason::EmptyPage;
            }

            let extracted_count = extracted.len();
            let fresh = dedup.retain_new(extracted);
            pages.push(PageSummary {
                page,
                extracted: extracted_count,
                added: fresh.len(),
            });
            records.extend(fresh);

            tracing::debug!(
                page,
                extracted = extracted_count,
                total = records.len(),
                has_more,
                extractor = extractor.name(),
                "Processed page"
            );
            self.reporter
                .log(format!(
                    "ページ{page}: {extracted_count}件取得（累計: {}件）",
                    records.len()
                ))
                .await;

            if !has_more {
                tracing::debug!("No more pages available");
                break StopReason::NoNextPage;
            }

            page += 1;
        };

        tracing::info!(
            url = base_url,
            records = records.len(),
            pages = pages.len(),
            ?stop_reason,
            "Completed paged crawl"
        );

        CrawlOutcome {
            records,
            pages,
            stop_reason,
        }
    }
}

/// Per-page count lines printed at the end of a crawl
pub fn summary_lines(pages: &[PageSummary]) -> Vec<String> {
    pages
        .iter()
        .map(|p| {
            let status = if p.extracted > 0 { "OK" } else { "要確認(0件)" };
            format!("ページ{:3}: {:3}件（新規 {}件）  {status}", p.page, p.extracted, p.added)
        })
        .collect()
}
