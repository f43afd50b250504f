use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::HTML_HEADERS;
use crate::error::Result;
use crate::fetcher::{decode_page, PageFetcher, PageShape};
use crate::monitor::{CheckOutcome, Monitor};
use crate::notifier::Notifier;
use crate::types::{Concert, ConcertPageProps};

/// The concert list is only ever served as HTML.
const CONCERT_SHAPES: &[PageShape] = &[PageShape::EmbeddedAttribute];

/// Watches the concert list for games of one team.
pub struct ConcertMonitor {
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    url: String,
    purchase_url: String,
    team_keyword: String,
}

impl ConcertMonitor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
        url: String,
        purchase_url: String,
        team_keyword: String,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            url,
            purchase_url,
            team_keyword,
        }
    }

    pub fn build_message(&self, concert: &Concert) -> String {
        let na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        [
            format!("🎫 *Tickets listed for a {} game!*", self.team_keyword),
            String::new(),
            format!("📅 Game: {}", na(&concert.name)),
            format!("🗓️ Date: {}", na(&concert.concert_date)),
            format!("⏰ Doors: {} / Start: {}", na(&concert.open_time), na(&concert.start_time)),
            format!("🏟️ Venue: {}", concert.venue()),
            format!("🎟️ Available: {}", concert.listed_count()),
            String::new(),
            format!("🔗 Buy: {}", self.purchase_url),
        ]
        .join("\n")
    }
}

/// Concerts whose name contains `keyword`, in page order.
pub fn matching_concerts<'a>(concerts: &'a [Concert], keyword: &str) -> Vec<&'a Concert> {
    concerts.iter().filter(|c| c.name_contains(keyword)).collect()
}

#[async_trait]
impl Monitor for ConcertMonitor {
    fn name(&self) -> &'static str {
        "concert check"
    }

    async fn check(&self) -> Result<CheckOutcome> {
        let body = self.fetcher.fetch_text(&self.url, HTML_HEADERS).await?;

        let page = match decode_page::<ConcertPageProps>(&body, CONCERT_SHAPES) {
            Ok((_, page)) => page,
            Err(e) if e.is_unrecognized_shape() => {
                warn!("[Concerts] could not parse page data");
                return Ok(CheckOutcome::NoData);
            }
            Err(e) => return Err(e),
        };

        let mut available = 0u64;
        let mut notified = 0usize;
        let mut first_failure = None;

        for concert in matching_concerts(&page.props.concerts, &self.team_keyword) {
            let count = concert.listed_count();
            info!(
                concert_id = ?concert.id,
                listed = count,
                "[Concerts] {} - listed tickets: {count}",
                concert.name.as_deref().unwrap_or("N/A"),
            );
            if count == 0 {
                continue;
            }
            available += count;

            // Each concert is delivered on its own; one failed send does not hold back the rest.
            match self.notifier.send(&self.build_message(concert)).await {
                Ok(()) => notified += 1,
                Err(e) => {
                    warn!("[Concerts] notification failed: {e}");
                    first_failure.get_or_insert(e);
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(CheckOutcome::Checked { available, notified }),
        }
    }
}
