use std::path::PathBuf;

use chrono::DateTime;
use ticket_monitor::monitor::format_thousands;
use ticket_monitor::types::Listing;

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub listings: usize,
    pub available: usize,
    /// Tickets across available listings.
    pub tickets: u64,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Dump file being shown; None when no dump could be located.
    pub source: Option<PathBuf>,
    pub status: LoadStatus,
    pub listings: Vec<Listing>,
    pub available_only: bool,
}

impl AppState {
    pub fn new(source: Option<PathBuf>) -> Self {
        Self {
            source,
            status: LoadStatus::Loading,
            listings: Vec::new(),
            available_only: false,
        }
    }

    /// (Re)read the dump file. On failure the previous listings stay on screen.
    pub async fn load(&mut self) {
        let Some(path) = self.source.clone() else {
            self.status = LoadStatus::Error("no dump file found".to_string());
            return;
        };
        self.status = LoadStatus::Loading;

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(r) => r,
            Err(e) => {
                self.status = LoadStatus::Error(format!("{}: {e}", path.display()));
                return;
            }
        };
        match serde_json::from_str::<Vec<Listing>>(&raw) {
            Ok(listings) => {
                self.listings = listings;
                self.status = LoadStatus::Loaded;
            }
            Err(e) => {
                self.status = LoadStatus::Error(format!("parse error: {e}"));
            }
        }
    }

    pub fn toggle_available_only(&mut self) {
        self.available_only = !self.available_only;
    }

    pub fn displayed(&self) -> Vec<&Listing> {
        self.listings
            .iter()
            .filter(|l| !self.available_only || l.is_available())
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let available: Vec<&Listing> = self.listings.iter().filter(|l| l.is_available()).collect();
        Summary {
            listings: self.listings.len(),
            available: available.len(),
            tickets: available.iter().map(|l| u64::from(l.quantity())).sum(),
            min_price: available.iter().map(|l| l.price()).min(),
            max_price: available.iter().map(|l| l.price()).max(),
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_price(v: Option<u64>) -> String {
    v.map_or("—".to_string(), |p| format!("¥{}", format_thousands(p)))
}

/// RFC 3339 timestamps shown as `MM-DD HH:MM`; anything else passes through.
pub fn format_listed_at(raw: Option<&str>) -> String {
    match raw {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.format("%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| s.to_string()),
        None => "—".to_string(),
    }
}

/// First ticket's seat, with a `+N` suffix when the listing bundles more.
pub fn seat_summary(listing: &Listing) -> String {
    let seats: Vec<&str> = listing
        .listing_tickets
        .iter()
        .filter_map(|t| t.ticket.as_ref()?.seat_info.as_deref())
        .collect();
    match seats.as_slice() {
        [] => "—".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} +{}", rest.len()),
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
