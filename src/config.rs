use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;

use crate::error::{AppError, Result};

pub const SITE_BASE_URL: &str = "https://tradead.tixplus.jp/wbc2026";
pub const LISTINGS_URL: &str = "https://tradead.tixplus.jp/wbc2026/buy/bidding/listings/1517";
pub const CONCERTS_URL: &str = "https://tradead.tixplus.jp/wbc2026";
pub const CRAWL_START_URL: &str =
    "https://tradead.tixplus.jp/wbc2026/buy/bidding/listings/more/1517?order=1";
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Concerts whose name contains this substring are watched ("Japan").
pub const TEAM_KEYWORD: &str = "日本";

/// Listing detail poll period (seconds).
pub const LISTINGS_INTERVAL_SECS: u64 = 3;

/// Concert list poll period (seconds).
pub const CONCERTS_INTERVAL_SECS: u64 = 60;

/// Ticks run only while the local hour is within this inclusive range.
pub const ACTIVE_START_HOUR: u32 = 6;
pub const ACTIVE_END_HOUR: u32 = 23;

/// Schedule timezone, UTC+08:00 (Asia/Taipei, no DST).
pub const SCHEDULE_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Timezone used for timestamps inside notifications, UTC+09:00 (Asia/Tokyo, no DST).
pub const DISPLAY_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// At most this many available tickets are detailed in one notification.
pub const MAX_TICKET_DETAILS: usize = 5;

/// Politeness delay between crawl pages (milliseconds).
pub const CRAWL_PAGE_DELAY_MS: u64 = 500;

/// HTTP client timeout (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Attribute holding the entity-encoded page JSON in server-rendered HTML.
pub const EMBEDDED_PAGE_ATTRIBUTE: &str = "data-page";

pub type HeaderSet = &'static [(&'static str, &'static str)];

/// Headers that make the upstream framework answer with its page JSON.
pub const PAGE_PROTOCOL_HEADERS: HeaderSet = &[
    ("accept", "text/html, application/xhtml+xml"),
    (
        "accept-language",
        "zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7,ja;q=0.6,zh-CN;q=0.5",
    ),
    ("content-type", "application/json"),
    (
        "sec-ch-ua",
        "\"Not:A-Brand\";v=\"99\", \"Google Chrome\";v=\"145\", \"Chromium\";v=\"145\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"macOS\""),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
    ("x-inertia", "true"),
    ("x-inertia-version", "52f9af2722878af6a3c1333e9a812f51"),
    ("x-requested-with", "XMLHttpRequest"),
];

/// Plain browser request; the concert list is always served as HTML.
pub const HTML_HEADERS: HeaderSet = &[("accept", "text/html, application/xhtml+xml")];

/// Paginated listing API used by the crawler.
pub const JSON_API_HEADERS: HeaderSet = &[
    ("accept", "application/json"),
    ("x-requested-with", "XMLHttpRequest"),
];

#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub telegram_api_url: String,
    pub site_base_url: String,
    pub listings_url: String,
    pub concerts_url: String,
    pub crawl_start_url: String,
    pub team_keyword: String,
    pub output_dir: PathBuf,
    /// Dump file rendered by the viewer (VIEWER_FILE). Falls back to the newest dump.
    pub viewer_file: Option<PathBuf>,
    pub schedule_offset: FixedOffset,
    pub display_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            chat_id: non_empty_var("TELEGRAM_CHAT_ID"),
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| TELEGRAM_API_URL.to_string()),
            site_base_url: std::env::var("SITE_BASE_URL")
                .unwrap_or_else(|_| SITE_BASE_URL.to_string()),
            listings_url: std::env::var("LISTINGS_URL")
                .unwrap_or_else(|_| LISTINGS_URL.to_string()),
            concerts_url: std::env::var("CONCERTS_URL")
                .unwrap_or_else(|_| CONCERTS_URL.to_string()),
            crawl_start_url: std::env::var("CRAWL_START_URL")
                .unwrap_or_else(|_| CRAWL_START_URL.to_string()),
            team_keyword: std::env::var("TEAM_KEYWORD")
                .unwrap_or_else(|_| TEAM_KEYWORD.to_string()),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            viewer_file: non_empty_var("VIEWER_FILE").map(PathBuf::from),
            schedule_offset: offset(SCHEDULE_UTC_OFFSET_SECS)?,
            display_offset: offset(DISPLAY_UTC_OFFSET_SECS)?,
        })
    }

    /// Bot credentials, present only when both token and chat id are set.
    /// None puts the notifier in log-only mode.
    pub fn telegram(&self) -> Option<TelegramCredentials> {
        match (&self.bot_token, &self.chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramCredentials {
                bot_token: bot_token.clone(),
                chat_id: chat_id.clone(),
            }),
            _ => None,
        }
    }

    pub fn listings_interval(&self) -> Duration {
        Duration::from_secs(LISTINGS_INTERVAL_SECS)
    }

    pub fn concerts_interval(&self) -> Duration {
        Duration::from_secs(CONCERTS_INTERVAL_SECS)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn offset(secs: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(secs)
        .ok_or_else(|| AppError::Config(format!("invalid UTC offset: {secs}s")))
}
