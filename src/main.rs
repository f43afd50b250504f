use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ticket_monitor::config::Config;
use ticket_monitor::error::Result;
use ticket_monitor::fetcher::{HttpFetcher, PageFetcher};
use ticket_monitor::monitor::{ConcertMonitor, ListingMonitor};
use ticket_monitor::notifier::{Notifier, TelegramNotifier};
use ticket_monitor::scheduler::{ActiveHours, PeriodicTask, Scheduler, TaskConfig};

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
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let http = HttpFetcher::new()?;

    let telegram = cfg.telegram();
    if telegram.is_none() {
        if cfg.bot_token.is_some() {
            warn!("TELEGRAM_CHAT_ID not set, notifications will only be logged");
        } else {
            warn!("TELEGRAM_BOT_TOKEN not set, notifications will only be logged");
        }
    }
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
        http.client().clone(),
        cfg.telegram_api_url.clone(),
        telegram,
    ));
    let fetcher: Arc<dyn PageFetcher> = Arc::new(http);

    let listings = ListingMonitor::new(
        Arc::clone(&fetcher),
        Arc::clone(&notifier),
        cfg.listings_url.clone(),
        cfg.site_base_url.clone(),
        cfg.display_offset,
    );
    let concerts = ConcertMonitor::new(
        Arc::clone(&fetcher),
        Arc::clone(&notifier),
        cfg.concerts_url.clone(),
        cfg.site_base_url.clone(),
        cfg.team_keyword.clone(),
    );

    let active_hours = ActiveHours::default();
    info!("Ticket monitor starting");
    info!("  timezone offset: {}", cfg.schedule_offset);
    info!("  listing check: every {:?} ({:02}:00-{:02}:59) {}", cfg.listings_interval(), active_hours.start, active_hours.end, cfg.listings_url);
    info!("  concert check: every {:?} ({:02}:00-{:02}:59) {}", cfg.concerts_interval(), active_hours.start, active_hours.end, cfg.concerts_url);

    let scheduler = Scheduler::start(vec![
        PeriodicTask::new(
            TaskConfig {
                period: cfg.listings_interval(),
                active_hours,
                offset: cfg.schedule_offset,
            },
            Arc::new(listings),
            Arc::clone(&notifier),
        ),
        PeriodicTask::new(
            TaskConfig {
                period: cfg.concerts_interval(),
                active_hours,
                offset: cfg.schedule_offset,
            },
            Arc::new(concerts),
            Arc::clone(&notifier),
        ),
    ]);

    if let Err(e) = notifier.send("🚀 Ticket monitor started!").await {
        warn!("Startup notice not delivered: {e}");
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, stopping {} tasks", scheduler.task_count());
    scheduler.shutdown().await;

    Ok(())
}
