use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ev_scraper::config::Config;
use ev_scraper::crawler::Target;

mod commands;

#[derive(Parser)]
#[command(
    name = "ev-scraper",
    version,
    about = "EV charger status, review and usage scraper for ev.gogo.gs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file (defaults to EVSCRAPER_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl one target and write its output files
    Crawl {
        /// What to crawl
        #[arg(value_enum, default_value_t = Target::Status)]
        target: Target,

        /// Override the page cap (0 = unlimited)
        #[arg(long)]
        max_pages: Option<u32>,

        /// Override the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip geocoding of status listings
        #[arg(long, default_value = "false")]
        no_geocode: bool,
    },

    /// Add the charging-result column to a review CSV
    Classify {
        /// Review CSV with a 口コミ内容 column
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV (defaults to <input>_with_charging_result.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Count filled and empty values of a CSV column
    Tally {
        /// CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Column to count
        #[arg(short, long, default_value = "充電結果")]
        column: String,
    },

    /// Run the scrape trigger API
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
    .context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("ev-scraper starting");

    match cli.command {
        Commands::Crawl {
            target,
            max_pages,
            output,
            no_geocode,
        } => {
            if let Some(max_pages) = max_pages {
                config.crawler.max_pages = max_pages;
            }
            if let Some(output) = output {
                config.output.dir = output;
            }
            if no_geocode {
                config.geocoding.enabled = false;
            }

            tracing::info!(
                target = %target,
                max_pages = config.crawler.max_pages,
                output = %config.output.dir.display(),
                "Starting crawl command"
            );
            commands::crawl(config, target).await?;
        }

        Commands::Classify { input, output } => {
            tracing::info!(input = %input.display(), output = ?output, "Starting classify command");
            commands::classify(&config, input, output)?;
        }

        Commands::Tally { input, column } => {
            tracing::info!(input = %input.display(), column = %column, "Starting tally command");
            commands::tally(input, column)?;
        }

        Commands::Serve { host, port } => {
            tracing::info!(host = ?host, port = ?port, "Starting serve command");
            commands::serve(config, host, port).await?;
        }
    }

    tracing::info!("ev-scraper completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("ev_scraper=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("ev_scraper={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
