//! Fault and maintenance status crawl
//!
//! Three stages, each paced on its own:
//!
//! 1. listing pages of both sources (fault first, then maintenance)
//! 2. one detail page per listing, filling connector type, output, port
//!    count and manufacturer
//! 3. geocoding of the final address

use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pipeline::{summary_lines, PagedCrawler};
use crate::crawler::progress::ProgressReporter;
use crate::error::Result;
use crate::geocode::{lookup, Geocoder};
use crate::models::{ListingRecord, StatusType};
use crate::parser::{extract_detail, DetailInfo, ListingExtractor, Page};
use crate::storage::Deduplicator;

/// Listing sources in crawl order
pub fn listing_sources(config: &Config) -> [(StatusType, String); 2] {
    [
        (StatusType::Fault, config.source_url(&config.sources.accident_path)),
        (
            StatusType::Maintenance,
            config.source_url(&config.sources.maintenance_path),
        ),
    ]
}

/// Crawl the listing pages of both sources
///
/// Each source is deduplicated on its own: the same facility may legitimately
/// appear as both a fault and a maintenance notice.
pub async fn crawl_listings(
    config: &Config,
    fetcher: &PageFetcher,
    reporter: &ProgressReporter,
) -> Result<Vec<ListingRecord>> {
    let crawler = PagedCrawler::new(fetcher, reporter, config.crawler.max_pages);
    let mut all = Vec::new();

    for (status_type, url) in listing_sources(config) {
        reporter.log(format!("【{status_type}情報の取得を開始】")).await;

        let extractor = ListingExtractor::new(&config.crawler.base_url, status_type)?;
        let mut dedup = Deduplicator::new(config.extraction.dedup_prefix_chars);
        let outcome = crawler.crawl(&url, &extractor, &mut dedup).await;

        for line in summary_lines(&outcome.pages) {
            reporter.log(line).await;
        }
        reporter
            .log(format!("{status_type}情報: {}件取得", outcome.records.len()))
            .await;
        all.extend(outcome.records);
    }

    reporter
        .log(format!("合計: {}件の施設情報を取得しました", all.len()))
        .await;
    Ok(all)
}

fn parse_detail(html: &str) -> DetailInfo {
    extract_detail(&Page::parse(html))
}

/// Fill detail fields from each listing's detail page
///
/// A detail page that cannot be fetched leaves its listing as it is.
/// Returns the number of listings enriched.
pub async fn enrich_details(
    records: &mut [ListingRecord],
    fetcher: &PageFetcher,
    reporter: &ProgressReporter,
) -> usize {
    let total = records.len();
    let mut enriched = 0;

    reporter.log("【詳細ページからの追加情報取得を開始】").await;

    for (idx, record) in records.iter_mut().enumerate() {
        reporter
            .log(format!(
                "[{}/{total}] {} の詳細情報を取得中...",
                idx + 1,
                record.facility_name
            ))
            .await;

        match fetcher.fetch(&record.detail_url).await {
            Ok(html) => {
                parse_detail(&html).apply_to(record);
                enriched += 1;
            }
            Err(e) => {
                reporter
                    .warn(format!(
                        "詳細ページの抽出エラー ({}): {e}",
                        record.detail_url
                    ))
                    .await;
            }
        }
    }

    enriched
}

/// Geocode every listing with a usable query
///
/// Returns the number of listings that received coordinates.
pub async fn geocode_listings(
    records: &mut [ListingRecord],
    geocoder: &dyn Geocoder,
    reporter: &ProgressReporter,
) -> usize {
    let total = records.len();
    let mut geocoded = 0;

    reporter.log("【住所から位置情報（緯度・経度）を取得中】").await;

    for (idx, record) in records.iter_mut().enumerate() {
        let Some(query) = record.geocode_query().map(str::to_string) else {
            continue;
        };

        reporter
            .log(format!("[{}/{total}] {query} の位置情報を取得中...", idx + 1))
            .await;

        if let Some(location) = lookup(geocoder, &query).await {
            record.set_coordinates(location.latitude, location.longitude);
            geocoded += 1;
        }
    }

    reporter
        .log(format!(
            "位置情報取得完了: {geocoded}/{total}件の施設の位置情報を取得しました。"
        ))
        .await;
    geocoded
}
