pub mod concert;
pub mod listing;

use async_trait::async_trait;

use crate::error::Result;

pub use concert::ConcertMonitor;
pub use listing::ListingMonitor;

/// One stateless availability check. Every call recomputes from a fresh fetch.
#[async_trait]
pub trait Monitor: Send + Sync {
    /// Short label used in logs and error reports.
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<CheckOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Page shape not recognised; nothing was evaluated this tick.
    NoData,
    Checked {
        /// Available tickets (listing) or listed tickets across matching concerts.
        available: u64,
        /// Notifications sent during this check.
        notified: usize,
    },
}

/// `48000` → `"48,000"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
