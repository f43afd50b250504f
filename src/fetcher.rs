use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::{HeaderSet, EMBEDDED_PAGE_ATTRIBUTE, HTTP_TIMEOUT_SECS};
use crate::error::{AppError, ParseError, Result};
use crate::types::PageEnvelope;

/// Issues a single GET and hands back the raw body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str, headers: HeaderSet) -> Result<String>;
}

/// `reqwest`-backed fetcher. One client per process.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str, headers: HeaderSet) -> Result<String> {
        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        debug!(url, bytes = body.len(), "fetched page");
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Page decoding
// ---------------------------------------------------------------------------

/// A way a page body may carry its JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    /// The body is the JSON page object itself.
    Json,
    /// Server-rendered HTML with the page object entity-encoded in `data-page="…"`.
    EmbeddedAttribute,
}

/// Result of trying one strategy against a body.
#[derive(Debug)]
enum Attempt {
    Decoded(Value),
    NotThisShape,
    Malformed(serde_json::Error),
}

impl PageShape {
    fn attempt(self, body: &str) -> Attempt {
        match self {
            PageShape::Json => match serde_json::from_str::<Value>(body) {
                Ok(v) => Attempt::Decoded(v),
                Err(_) => Attempt::NotThisShape,
            },
            PageShape::EmbeddedAttribute => match extract_attribute(body, EMBEDDED_PAGE_ATTRIBUTE) {
                Some(raw) => match serde_json::from_str::<Value>(&decode_html_entities(raw)) {
                    Ok(v) => Attempt::Decoded(v),
                    Err(e) => Attempt::Malformed(e),
                },
                None => Attempt::NotThisShape,
            },
        }
    }
}

/// Try each strategy in order; the first one that recognises the body wins.
pub fn decode_page_value(body: &str, strategies: &[PageShape]) -> Result<(PageShape, Value)> {
    for &shape in strategies {
        match shape.attempt(body) {
            Attempt::Decoded(v) => return Ok((shape, v)),
            Attempt::Malformed(e) => return Err(ParseError::Malformed(e).into()),
            Attempt::NotThisShape => continue,
        }
    }
    Err(ParseError::UnrecognizedShape.into())
}

/// Decode a body into a typed page envelope.
pub fn decode_page<P: DeserializeOwned + Default>(
    body: &str,
    strategies: &[PageShape],
) -> Result<(PageShape, PageEnvelope<P>)> {
    let (shape, value) = decode_page_value(body, strategies)?;
    let page = serde_json::from_value(value).map_err(ParseError::Schema)?;
    Ok((shape, page))
}

/// Value of the first `name="…"` attribute in `html`, still entity-encoded.
pub fn extract_attribute<'a>(html: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!("{name}=\"");
    let start = html.find(&marker)? + marker.len();
    let len = html[start..].find('"')?;
    Some(&html[start..start + len])
}

/// Decodes the five entities the upstream renderer emits. `&amp;` goes after
/// `&quot;`/`&#039;` so double-escaped text decodes only one level.
pub fn decode_html_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{direct_client, serve_once, split_request};
    use crate::types::{ConcertPageProps, ListingPageProps};

    #[test]
    fn decodes_all_entities() {
        assert_eq!(
            decode_html_entities("&quot;a&#039;b&amp;c&lt;d&gt;"),
            "\"a'b&c<d>"
        );
    }

    #[test]
    fn ampersand_decoded_once() {
        assert_eq!(decode_html_entities("&amp;quot;"), "&quot;");
    }

    #[test]
    fn extracts_first_attribute_value() {
        let html = r#"<div id="app" data-page="{&quot;a&quot;:1}"></div><div data-page="x"></div>"#;
        assert_eq!(extract_attribute(html, "data-page"), Some("{&quot;a&quot;:1}"));
        assert_eq!(extract_attribute(html, "data-missing"), None);
    }

    #[test]
    fn json_strategy_wins_for_json_body() {
        let (shape, v) =
            decode_page_value(r#"{"props":{"concerts":[]}}"#, &[PageShape::Json, PageShape::EmbeddedAttribute])
                .unwrap();
        assert_eq!(shape, PageShape::Json);
        assert!(v["props"]["concerts"].is_array());
    }

    #[test]
    fn falls_back_to_embedded_attribute() {
        let html = r#"<html><div id="app" data-page="{&quot;props&quot;:{&quot;concerts&quot;:[{&quot;name&quot;:&quot;Japan &amp; Co&quot;}]}}"></div></html>"#;
        let (shape, page) = decode_page::<ConcertPageProps>(
            html,
            &[PageShape::Json, PageShape::EmbeddedAttribute],
        )
        .unwrap();
        assert_eq!(shape, PageShape::EmbeddedAttribute);
        assert_eq!(page.props.concerts[0].name.as_deref(), Some("Japan & Co"));
    }

    #[test]
    fn unrecognized_body_is_a_shape_error() {
        let err = decode_page_value("<html>maintenance</html>", &[PageShape::Json, PageShape::EmbeddedAttribute])
            .unwrap_err();
        assert!(err.is_unrecognized_shape());
    }

    #[test]
    fn embedded_only_rejects_plain_json() {
        let err = decode_page_value(r#"{"props":{}}"#, &[PageShape::EmbeddedAttribute]).unwrap_err();
        assert!(err.is_unrecognized_shape());
    }

    #[test]
    fn malformed_embedded_json_is_reported() {
        let err = decode_page_value(r#"<div data-page="{not json"></div>"#, &[PageShape::EmbeddedAttribute])
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(ParseError::Malformed(_))));
    }

    #[test]
    fn schema_mismatch_is_reported() {
        let err = decode_page::<ConcertPageProps>(r#"{"props":{"concerts":"none"}}"#, &[PageShape::Json])
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(ParseError::Schema(_))));
    }

    #[test]
    fn missing_props_decode_to_default() {
        let (_, page) = decode_page::<ListingPageProps>(r#"{"component":"Listings"}"#, &[PageShape::Json]).unwrap();
        assert!(page.props.concert.is_none());
        assert!(page.props.tickets().is_empty());
    }

    #[tokio::test]
    async fn http_fetch_returns_body_and_sends_headers() {
        let (base, server) = serve_once(200, r#"{"props":{}}"#).await;
        let fetcher = HttpFetcher::with_client(direct_client());
        let url = format!("{base}/wbc2026/listings/1517");

        let body = fetcher
            .fetch_text(&url, &[("x-inertia", "true"), ("accept", "text/html")])
            .await
            .unwrap();
        assert_eq!(body, r#"{"props":{}}"#);

        let request = server.await.unwrap();
        let (head, _) = split_request(&request);
        assert!(head.starts_with("GET /wbc2026/listings/1517 HTTP/1.1"));
        assert!(head.to_ascii_lowercase().contains("x-inertia: true"));
    }

    #[tokio::test]
    async fn non_success_status_is_http_status_error() {
        let (base, server) = serve_once(500, "oops").await;
        let fetcher = HttpFetcher::with_client(direct_client());
        let url = format!("{base}/busy");

        let err = fetcher.fetch_text(&url, &[]).await.unwrap_err();
        assert!(err.is_network());
        assert!(matches!(err, AppError::HttpStatus { status: 500, url: ref u } if *u == url));
        server.await.unwrap();
    }
}
