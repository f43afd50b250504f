use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};

use crate::config::{MAX_TICKET_DETAILS, PAGE_PROTOCOL_HEADERS};
use crate::error::Result;
use crate::fetcher::{decode_page, PageFetcher, PageShape};
use crate::monitor::{format_thousands, CheckOutcome, Monitor};
use crate::notifier::Notifier;
use crate::types::{ConcertSummary, Listing, ListingPageProps};

/// The listing endpoint answers with page JSON when the protocol headers are
/// honoured, and with full HTML otherwise.
const LISTING_SHAPES: &[PageShape] = &[PageShape::Json, PageShape::EmbeddedAttribute];

/// Watches the detail page of one fixed listing group.
pub struct ListingMonitor {
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    url: String,
    site_base_url: String,
    display_offset: FixedOffset,
}

impl ListingMonitor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
        url: String,
        site_base_url: String,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            url,
            site_base_url,
            display_offset,
        }
    }

    fn buy_url(&self, listing_id: u64) -> String {
        format!(
            "{}/buy/bidding/payment-type/{listing_id}",
            self.site_base_url.trim_end_matches('/')
        )
    }

    /// Notification text for a non-empty set of available tickets.
    pub fn build_message(
        &self,
        concert: &ConcertSummary,
        available: &[&Listing],
        checked_at: DateTime<FixedOffset>,
    ) -> String {
        let details = available
            .iter()
            .take(MAX_TICKET_DETAILS)
            .enumerate()
            .map(|(i, t)| {
                let line = format!(
                    "{}. {} - ¥{} (x{})",
                    i + 1,
                    t.seat_type_name(),
                    format_thousands(t.price()),
                    t.quantity(),
                );
                match t.id {
                    Some(id) => format!("{line}\n {}", self.buy_url(id)),
                    None => line,
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        [
            "🎫 *Tickets available! Grab them now!*".to_string(),
            String::new(),
            format!("🏟️ {}", or_na(&concert.name)),
            format!("📅 {} {}", or_na(&concert.concert_date), or_na(&concert.start_time)),
            format!("🎟️ Available: *{}*", available.len()),
            String::new(),
            details,
            String::new(),
            format!("🔗 {}", self.url),
            format!("⏰ Checked at: {}", checked_at.format("%Y/%m/%d %H:%M:%S")),
        ]
        .join("\n")
    }
}

/// Tickets that can still be bought, in page order.
pub fn available_tickets(tickets: &[Listing]) -> Vec<&Listing> {
    tickets.iter().filter(|t| t.is_available()).collect()
}

fn or_na(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("N/A")
}

#[async_trait]
impl Monitor for ListingMonitor {
    fn name(&self) -> &'static str {
        "listing check"
    }

    async fn check(&self) -> Result<CheckOutcome> {
        let body = self.fetcher.fetch_text(&self.url, PAGE_PROTOCOL_HEADERS).await?;

        let page = match decode_page::<ListingPageProps>(&body, LISTING_SHAPES) {
            Ok((shape, page)) => {
                debug!(?shape, "[Listings] decoded page");
                page
            }
            Err(e) if e.is_unrecognized_shape() => {
                warn!("[Listings] could not parse page data");
                return Ok(CheckOutcome::NoData);
            }
            Err(e) => return Err(e),
        };

        let concert = page.props.concert.clone().unwrap_or_default();
        let available = available_tickets(page.props.tickets());
        info!(
            available = available.len(),
            "[Listings] {} - available tickets: {}",
            or_na(&concert.name),
            available.len(),
        );

        if available.is_empty() {
            return Ok(CheckOutcome::Checked {
                available: 0,
                notified: 0,
            });
        }

        let checked_at = Utc::now().with_timezone(&self.display_offset);
        let text = self.build_message(&concert, &available, checked_at);
        self.notifier.send(&text).await?;

        Ok(CheckOutcome::Checked {
            available: available.len() as u64,
            notified: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::testing::{embed_page, RecordingNotifier, ScriptedFetcher};
    use chrono::TimeZone;
    use serde_json::json;

    const URL: &str = "https://tickets.test/wbc2026/buy/bidding/listings/1517";

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn monitor(fetcher: ScriptedFetcher, notifier: Arc<RecordingNotifier>) -> ListingMonitor {
        ListingMonitor::new(
            Arc::new(fetcher),
            notifier,
            URL.to_string(),
            "https://tickets.test/wbc2026".to_string(),
            jst(),
        )
    }

    fn page(listings: serde_json::Value) -> serde_json::Value {
        json!({
            "component": "Buy/Bidding/Listings",
            "props": {
                "concert": {"name": "Japan vs Chinese Taipei", "concert_date": "2026-03-06", "start_time": "19:00"},
                "listings": {"data": listings}
            }
        })
    }

    #[tokio::test]
    async fn no_notification_when_nothing_available() {
        let body = page(json!([
            {"id": 1, "status": "settlement_complete"},
            {"id": 2, "status": "cancelled"},
            {"id": 3, "status": "open", "is_biddable": false}
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(ScriptedFetcher::with_body(body.to_string()), notifier.clone());

        let outcome = m.check().await.unwrap();
        assert_eq!(outcome, CheckOutcome::Checked { available: 0, notified: 0 });
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn notifies_once_when_tickets_available() {
        let body = page(json!([
            {"id": 11, "status": "open", "is_biddable": true, "seat_type": {"name": "Infield A"}, "total_resale_price": 48000, "ticket_count": 2},
            {"id": 12, "status": "cancelled"},
            {"id": 13}
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(ScriptedFetcher::with_body(body.to_string()), notifier.clone());

        let outcome = m.check().await.unwrap();
        assert_eq!(outcome, CheckOutcome::Checked { available: 2, notified: 1 });

        let sent = notifier.messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Japan vs Chinese Taipei"));
        assert!(sent[0].contains("Available: *2*"));
        assert!(sent[0].contains("1. Infield A - ¥48,000 (x2)"));
        assert!(sent[0].contains("https://tickets.test/wbc2026/buy/bidding/payment-type/11"));
        assert!(sent[0].contains("2. N/A - ¥0 (x1)"));
        assert!(sent[0].contains(URL));
    }

    #[tokio::test]
    async fn row_without_id_is_listed_without_link() {
        let body = page(json!([
            {"status": "open", "total_resale_price": 1000},
            {"id": 21, "status": "open", "ticket_count": 0, "total_resale_price": 2000}
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(ScriptedFetcher::with_body(body.to_string()), notifier.clone());

        let outcome = m.check().await.unwrap();
        assert_eq!(outcome, CheckOutcome::Checked { available: 2, notified: 1 });

        let sent = notifier.messages();
        assert!(sent[0].contains("1. N/A - ¥1,000 (x1)\n\n2. N/A - ¥2,000 (x1)"));
        assert!(sent[0].contains("payment-type/21"));
    }

    #[tokio::test]
    async fn falls_back_to_html_embedded_page() {
        let body = embed_page(&page(json!([{"id": 5, "status": "open"}])));
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(ScriptedFetcher::with_body(body), notifier.clone());

        let outcome = m.check().await.unwrap();
        assert_eq!(outcome, CheckOutcome::Checked { available: 1, notified: 1 });
    }

    #[tokio::test]
    async fn unrecognized_page_is_skipped() {
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(ScriptedFetcher::with_body("<html>busy</html>"), notifier.clone());

        assert_eq!(m.check().await.unwrap(), CheckOutcome::NoData);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let notifier = Arc::new(RecordingNotifier::default());
        let fetcher = ScriptedFetcher::new([Err(AppError::HttpStatus { status: 502, url: URL.to_string() })]);
        let m = monitor(fetcher, notifier.clone());

        let err = m.check().await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn delivery_failure_propagates() {
        let body = page(json!([{"id": 1}]));
        let notifier = Arc::new(RecordingNotifier::failing());
        let m = monitor(ScriptedFetcher::with_body(body.to_string()), notifier.clone());

        assert!(matches!(m.check().await, Err(AppError::Notify(_))));
    }

    #[test]
    fn message_details_at_most_five_tickets() {
        let tickets: Vec<Listing> = (1..=7)
            .map(|id| serde_json::from_value(json!({"id": id, "total_resale_price": 1000})).unwrap())
            .collect();
        let available = available_tickets(&tickets);
        let m = monitor(ScriptedFetcher::default(), Arc::new(RecordingNotifier::default()));
        let at = jst().with_ymd_and_hms(2026, 3, 6, 18, 30, 0).unwrap();

        let text = m.build_message(&ConcertSummary::default(), &available, at);
        assert!(text.contains("Available: *7*"));
        assert!(text.contains("5. N/A"));
        assert!(!text.contains("6. N/A"));
        assert!(text.contains("🏟️ N/A"));
        assert!(text.contains("Checked at: 2026/03/06 18:30:00"));
    }
}
