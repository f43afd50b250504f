use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ticket_monitor::config::{Config, CRAWL_PAGE_DELAY_MS};
use ticket_monitor::crawl::{crawl, write_dump};
use ticket_monitor::error::Result;
use ticket_monitor::fetcher::HttpFetcher;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Crawl failed: {e}");
        eprintln!("Crawl failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!("Starting crawl from {}", cfg.crawl_start_url);

    let fetcher = HttpFetcher::new()?;
    let result = crawl(
        &fetcher,
        &cfg.crawl_start_url,
        Duration::from_millis(CRAWL_PAGE_DELAY_MS),
    )
    .await?;

    let path = write_dump(&cfg.output_dir, &result.records, Utc::now()).await?;
    info!(
        pages = result.pages,
        "Done: {} records written to {}",
        result.records.len(),
        path.display(),
    );
    Ok(())
}
