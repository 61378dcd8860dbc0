//! Crawling of ev.gogo.gs
//!
//! [`run`] is the single entry point used by the CLI and the trigger API: it
//! crawls one [`Target`], writes its output files and reports progress.

pub mod fetcher;
pub mod headers;
pub mod pipeline;
pub mod progress;
pub mod status;

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::geocode::NominatimGeocoder;
use crate::models::{CrawlRecord, ReviewRecord};
use crate::parser::{review_extractor, usage_extractor};
use crate::storage::{
    timestamped_csv, write_json, write_records, Deduplicator, REVIEW_FILE_PREFIX,
    USAGE_FILE_PREFIX,
};

pub use fetcher::PageFetcher;
pub use pipeline::{page_url, CrawlOutcome, PageSummary, PagedCrawler, StopReason};
pub use progress::{ProgressEvent, ProgressReporter};

/// What to crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Target {
    /// Fault and maintenance listings with detail enrichment and geocoding
    #[default]
    Status,
    /// User reviews, classified by charging result
    Reviews,
    /// Usage records
    Usage,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Reviews => "reviews",
            Self::Usage => "usage",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "reviews" | "review" => Ok(Self::Reviews),
            "usage" | "using" => Ok(Self::Usage),
            other => Err(format!("unknown target: {other}")),
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target: Target,
    pub records: usize,
    pub outputs: Vec<PathBuf>,
}

/// Classifier from the configured rule file, else the built-in table
pub fn load_classifier(config: &Config) -> Result<Classifier> {
    match &config.extraction.classifier_rules {
        Some(path) => Classifier::from_file(path)
            .with_context(|| format!("Failed to load classifier rules: {}", path.display())),
        None => Ok(Classifier::default()),
    }
}

/// Crawl one target and write its output
///
/// Output files are written only once every record is in memory. Network
/// failures shorten the crawl; output failures are returned.
pub async fn run(target: Target, config: &Config, reporter: &ProgressReporter) -> Result<RunSummary> {
    config.validate().context("Invalid configuration")?;
    tracing::info!(%target, base_url = %config.crawler.base_url, "Starting crawl");

    let fetcher = PageFetcher::new(&config.crawler).context("Failed to create HTTP client")?;

    let summary = match target {
        Target::Status => run_status(config, &fetcher, reporter).await?,
        Target::Reviews => run_reviews(config, &fetcher, reporter).await?,
        Target::Usage => run_usage(config, &fetcher, reporter).await?,
    };

    tracing::info!(
        %target,
        records = summary.records,
        outputs = summary.outputs.len(),
        "Crawl finished"
    );
    Ok(summary)
}

async fn run_status(
    config: &Config,
    fetcher: &PageFetcher,
    reporter: &ProgressReporter,
) -> Result<RunSummary> {
    reporter.log("GOGOEV 故障・メンテナンス情報収集").await;

    let mut records = status::crawl_listings(config, fetcher, reporter).await?;

    if config.crawler.fetch_details {
        let detail_fetcher = fetcher.with_interval(config.detail_delay());
        status::enrich_details(&mut records, &detail_fetcher, reporter).await;
    }

    if config.geocoding.enabled {
        let geocoder =
            NominatimGeocoder::new(&config.geocoding).context("Failed to create geocoder")?;
        status::geocode_listings(&mut records, &geocoder, reporter).await;
    }

    let csv_path = config.output.dir.join(&config.output.status_csv);
    write_records(&csv_path, &records)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    reporter
        .log(format!("CSV: {} に {}件のデータを保存しました。", csv_path.display(), records.len()))
        .await;

    let json_path = config.output.dashboard_json.clone();
    write_json(&json_path, &records)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    reporter
        .log(format!("JSON: {} に {}件のデータを保存しました。", json_path.display(), records.len()))
        .await;

    Ok(RunSummary {
        target: Target::Status,
        records: records.len(),
        outputs: vec![csv_path, json_path],
    })
}

async fn run_reviews(
    config: &Config,
    fetcher: &PageFetcher,
    reporter: &ProgressReporter,
) -> Result<RunSummary> {
    reporter.log("GOGOEV 口コミ投稿一覧スクレイピング").await;

    let classifier = load_classifier(config)?;
    let extraction = &config.extraction;
    let extractor = review_extractor(
        extraction.review_fallback_threshold,
        extraction.review_window,
        extraction.chrome_tokens.clone(),
    );
    let mut dedup = Deduplicator::new(extraction.dedup_prefix_chars);

    let url = config.source_url(&config.sources.review_path);
    let outcome = PagedCrawler::new(fetcher, reporter, config.crawler.max_pages)
        .crawl(&url, &extractor, &mut dedup)
        .await;

    let mut records: Vec<ReviewRecord> = outcome.records;
    for record in &mut records {
        record.charging_result = Some(classifier.classify(&record.content));
    }

    finish_paged_crawl(
        config,
        reporter,
        &outcome.pages,
        &records,
        REVIEW_FILE_PREFIX,
        Target::Reviews,
    )
    .await
}

async fn run_usage(
    config: &Config,
    fetcher: &PageFetcher,
    reporter: &ProgressReporter,
) -> Result<RunSummary> {
    reporter.log("GOGOEV 利用記録スクレイピング").await;

    let extractor = usage_extractor(config.extraction.usage_window);
    let mut dedup = Deduplicator::new(config.extraction.dedup_prefix_chars);

    let url = config.source_url(&config.sources.usage_path);
    let outcome = PagedCrawler::new(fetcher, reporter, config.crawler.max_pages)
        .crawl(&url, &extractor, &mut dedup)
        .await;

    finish_paged_crawl(
        config,
        reporter,
        &outcome.pages,
        &outcome.records,
        USAGE_FILE_PREFIX,
        Target::Usage,
    )
    .await
}

/// Print the page summary and write a timestamped CSV when anything was found
async fn finish_paged_crawl<R: CrawlRecord>(
    config: &Config,
    reporter: &ProgressReporter,
    pages: &[PageSummary],
    records: &[R],
    prefix: &str,
    target: Target,
) -> Result<RunSummary> {
    reporter.log("【確認】ページ別取得件数").await;
    for line in pipeline::summary_lines(pages) {
        reporter.log(line).await;
    }
    reporter
        .log(format!("取得件数（重複除く）: {}件", records.len()))
        .await;

    if records.is_empty() {
        reporter.warn("データを取得できませんでした。").await;
        return Ok(RunSummary {
            target,
            records: 0,
            outputs: Vec::new(),
        });
    }

    let path = timestamped_csv(&config.output.dir, prefix, Local::now());
    write_records(&path, records).with_context(|| format!("Failed to write {}", path.display()))?;
    reporter
        .log(format!("CSVファイルに保存しました: {}", path.display()))
        .await;

    Ok(RunSummary {
        target,
        records: records.len(),
        outputs: vec![path],
    })
}
