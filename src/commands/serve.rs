use anyhow::{Context, Result};

use ev_scraper::config::Config;
use ev_scraper::server::ApiServer;

pub async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    println!("Starting EV Charger Data Collection API");
    println!("=======================================");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!("  Allowed origins: {}", config.server.allowed_origins.join(", "));
    println!();
    println!("Endpoints:");
    println!("  GET  /");
    println!("  GET  /health");
    println!("  POST /run-scrape?target=status|reviews|usage");
    println!("  POST /geocode");
    println!();
    println!("Press Ctrl+C to stop");

    let server = ApiServer::new(config).context("Failed to create API server")?;
    server.start().await.context("API server failed")?;

    Ok(())
}
