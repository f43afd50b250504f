use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Page envelope
// ---------------------------------------------------------------------------

/// Server-rendered page object. Only `props` is read; a missing `props`
/// decodes as the props type's default.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope<P> {
    #[serde(default)]
    pub props: P,
}

// ---------------------------------------------------------------------------
// Listing detail page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPageProps {
    #[serde(default)]
    pub concert: Option<ConcertSummary>,
    #[serde(default)]
    pub listings: Option<ListingCollection>,
}

impl ListingPageProps {
    pub fn tickets(&self) -> &[Listing] {
        self.listings.as_ref().map_or(&[], |l| l.data.as_slice())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConcertSummary {
    pub name: Option<String>,
    pub concert_date: Option<String>,
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingCollection {
    #[serde(default)]
    pub data: Vec<Listing>,
}

/// Lifecycle label of a resale listing. Unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingStatus {
    Open,
    SettlementComplete,
    Cancelled,
    Other(String),
}

impl ListingStatus {
    /// Settled or cancelled listings can no longer be bought.
    pub fn is_closed(&self) -> bool {
        matches!(self, ListingStatus::SettlementComplete | ListingStatus::Cancelled)
    }
}

impl From<String> for ListingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "open" => ListingStatus::Open,
            "settlement_complete" => ListingStatus::SettlementComplete,
            "cancelled" => ListingStatus::Cancelled,
            _ => ListingStatus::Other(s),
        }
    }
}

impl From<ListingStatus> for String {
    fn from(s: ListingStatus) -> Self {
        s.to_string()
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ListingStatus::Open => "open",
            ListingStatus::SettlementComplete => "settlement_complete",
            ListingStatus::Cancelled => "cancelled",
            ListingStatus::Other(label) => label.as_str(),
        };
        write!(f, "{s}")
    }
}

/// One resale listing. Every field is optional upstream; a row without `id`
/// still counts but has no purchase link.
///
/// Defaulting rules:
/// - missing `status` counts as not closed
/// - missing `is_biddable` counts as biddable
/// - missing `ticket_count` counts as 1 ticket
/// - missing `total_resale_price` counts as 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub concert_id: Option<u64>,
    #[serde(default)]
    pub status: Option<ListingStatus>,
    #[serde(default)]
    pub is_biddable: Option<bool>,
    #[serde(default)]
    pub seat_type: Option<SeatType>,
    #[serde(default)]
    pub ticket_count: Option<u32>,
    #[serde(default)]
    pub total_resale_price: Option<u64>,
    #[serde(default)]
    pub total_basic_price: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub listing_tickets: Vec<ListingTicket>,
    #[serde(default)]
    pub concert_trade_schedule: Option<ConcertTradeSchedule>,
}

impl Listing {
    /// A listing is available unless it is settled/cancelled or explicitly not biddable.
    pub fn is_available(&self) -> bool {
        let closed = self.status.as_ref().is_some_and(ListingStatus::is_closed);
        !closed && self.is_biddable != Some(false)
    }

    pub fn seat_type_name(&self) -> &str {
        self.seat_type
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or("N/A")
    }

    pub fn price(&self) -> u64 {
        self.total_resale_price.unwrap_or(0)
    }

    /// Zero and missing both read as a single ticket.
    pub fn quantity(&self) -> u32 {
        self.ticket_count.filter(|&c| c > 0).unwrap_or(1)
    }

    pub fn trade_schedule_name(&self) -> Option<&str> {
        self.concert_trade_schedule
            .as_ref()
            .and_then(|c| c.trade_schedule.as_ref())
            .and_then(|t| t.name.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatType {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingTicket {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub resale_price: Option<u64>,
    #[serde(default)]
    pub ticket: Option<TicketInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketInfo {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub order_no: Option<String>,
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default)]
    pub seat_info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcertTradeSchedule {
    #[serde(default)]
    pub trade_schedule: Option<TradeSchedule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSchedule {
    #[serde(default)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Concert list page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConcertPageProps {
    #[serde(default)]
    pub concerts: Vec<Concert>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Concert {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub concert_date: Option<String>,
    #[serde(default)]
    pub open_time: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub tour: Option<Tour>,
    #[serde(default)]
    pub listings_count: Option<u64>,
}

impl Concert {
    pub fn name_contains(&self, keyword: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.contains(keyword))
    }

    pub fn listed_count(&self) -> u64 {
        self.listings_count.unwrap_or(0)
    }

    pub fn venue(&self) -> &str {
        self.tour
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tour {
    #[serde(default)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Paginated listing API
// ---------------------------------------------------------------------------

/// One page of the crawl endpoint. Records are kept opaque.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedPage {
    #[serde(default)]
    pub current_page: Option<u64>,
    pub data: Vec<serde_json::Value>,
    pub next_page_url: Option<String>,
    #[serde(default)]
    pub last_page: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}
