use anyhow::Result;

use ev_scraper::config::Config;
use ev_scraper::crawler::{self, ProgressReporter, Target};

pub async fn crawl(config: Config, target: Target) -> Result<()> {
    println!("Starting {target} crawl");
    println!("========================");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Output: {}", config.output.dir.display());
    println!();

    // Progress lines reach the terminal through tracing
    let reporter = ProgressReporter::silent();
    let summary = crawler::run(target, &config, &reporter).await?;

    println!();
    println!("Crawl Complete");
    println!("==============");
    println!("  Records: {}", summary.records);
    for path in &summary.outputs {
        println!("  Wrote: {}", path.display());
    }

    Ok(())
}
