//! One-shot paginated dump of the listing API.
//!
//! `start → fetch_page → (next_page_url?) → fetch_page | done`, with a fixed
//! pause between pages. There is no retry: the first failure aborts the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::Value;
use tracing::info;

use crate::config::JSON_API_HEADERS;
use crate::error::{AppError, ParseError, Result};
use crate::fetcher::{decode_page_value, PageFetcher, PageShape};
use crate::types::PaginatedPage;

#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Every record from every page, in encounter order.
    pub records: Vec<Value>,
    pub pages: usize,
    /// Running total reported by the last page.
    pub reported_total: Option<u64>,
}

pub async fn crawl(fetcher: &dyn PageFetcher, start_url: &str, page_delay: Duration) -> Result<CrawlResult> {
    let mut records: Vec<Value> = Vec::new();
    let mut pages = 0usize;
    let mut reported_total = None;
    let mut next = Some(start_url.to_string());

    while let Some(url) = next {
        pages += 1;
        info!("[Crawl] fetching page {pages}: {url}");

        let body = fetcher.fetch_text(&url, JSON_API_HEADERS).await?;
        let page = parse_page(&body)?;

        let got = page.data.len();
        records.extend(page.data);
        reported_total = page.total.or(reported_total);
        info!(
            page = ?page.current_page,
            last_page = ?page.last_page,
            "[Crawl]   got {got} records (accumulated: {}/{})",
            records.len(),
            reported_total.map_or("?".to_string(), |t| t.to_string()),
        );

        next = page
            .next_page_url
            .filter(|n| !n.is_empty())
            .map(|n| resolve_url(&url, &n))
            .transpose()?;
        if next.is_some() {
            tokio::time::sleep(page_delay).await;
        }
    }

    Ok(CrawlResult {
        records,
        pages,
        reported_total,
    })
}

fn parse_page(body: &str) -> Result<PaginatedPage> {
    let (_, value) = decode_page_value(body, &[PageShape::Json])?;
    Ok(serde_json::from_value(value).map_err(ParseError::Schema)?)
}

/// `next_page_url` is normally absolute; relative links resolve against the current page.
fn resolve_url(current: &str, next: &str) -> Result<String> {
    let base = Url::parse(current).map_err(|e| invalid_url(current, e))?;
    let joined = base.join(next).map_err(|e| invalid_url(next, e))?;
    Ok(joined.to_string())
}

fn invalid_url(url: &str, reason: impl std::fmt::Display) -> AppError {
    AppError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// `2026-03-06T10:15:30.123Z` → `2026-03-06_10-15-30-123.json`
pub fn dump_file_name(now: DateTime<Utc>) -> String {
    format!("{}.json", now.format("%Y-%m-%d_%H-%M-%S-%3f"))
}

/// Write `records` as a pretty-printed JSON array under `dir`, creating it if needed.
pub async fn write_dump(dir: &Path, records: &[Value], now: DateTime<Utc>) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(dump_file_name(now));
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}

/// Newest dump in `dir`. Timestamped names sort chronologically.
pub fn latest_dump(dir: &Path) -> Result<Option<PathBuf>> {
    let mut newest: Option<PathBuf> = None;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if newest.as_ref().map_or(true, |n| path.file_name() > n.file_name()) {
            newest = Some(path);
        }
    }
    Ok(newest)
}
