use crate::config::USER_AGENT;
use crate::error::NetworkError;
use crate::MuseumListing;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const DETAIL_PATTERN: &str = "ficha.php?table=museo&table_id=";

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static TABLE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"table_id=(\d+)").expect("static regex"));

/// Anything that can hand back the visible text of a detail page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn page_text(&self, url: &str) -> Result<String, NetworkError>;
}

pub struct Scraper {
    client: Client,
    page_timeout: Duration,
}

impl Scraper {
    pub fn new(page_timeout: Duration) -> Result<Self, NetworkError> {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(NetworkError::Client)?;
        Ok(Self {
            client,
            page_timeout,
        })
    }

    /// Downloads the directory page and returns every museum it links to.
    pub async fn fetch_listing(
        &self,
        base_url: &str,
        list_path: &str,
    ) -> Result<Vec<MuseumListing>, NetworkError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), list_path);
        info!(%url, "downloading museum directory");

        let body = self.get(&url, None, |status| status.is_success()).await?;
        let listings = parse_listing(&body, base_url)?;

        info!(count = listings.len(), "unique museums found");
        Ok(listings)
    }

    /// GET `url`, failing with `NetworkError::Status` unless `accept(status)` holds.
    async fn get(
        &self,
        url: &str,
        timeout: Option<Duration>,
        accept: fn(StatusCode) -> bool,
    ) -> Result<String, NetworkError> {
        let request_error = |source| NetworkError::Request {
            url: url.to_string(),
            source,
        };

        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let res = request.send().await.map_err(request_error)?;

        if !accept(res.status()) {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: res.status(),
            });
        }

        res.text().await.map_err(request_error)
    }
}

#[async_trait]
impl PageSource for Scraper {
    async fn page_text(&self, url: &str) -> Result<String, NetworkError> {
        // detail pages must answer exactly 200, anything else is skipped
        let body = self
            .get(url, Some(self.page_timeout), |status| status == StatusCode::OK)
            .await?;
        let text = flatten_text(&body);
        debug!(%url, chars = text.chars().count(), "flattened detail page");
        Ok(text)
    }
}

/// Extracts the museum links from a directory page.
///
/// Only anchors pointing at a museum detail page count. Anchors without text
/// (image links) are skipped and the first anchor for a given `table_id` wins.
/// An anchor whose href cannot be resolved is logged and skipped on its own.
pub fn parse_listing(html: &str, base_url: &str) -> Result<Vec<MuseumListing>, NetworkError> {
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/'))).map_err(|source| {
        NetworkError::InvalidUrl {
            url: base_url.to_string(),
            source,
        }
    })?;

    let doc = Html::parse_document(html);
    let mut seen_ids = HashSet::new();
    let mut museums = Vec::new();

    for el in doc.select(&ANCHOR) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if !href.contains(DETAIL_PATTERN) {
            continue;
        }

        let name = el
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            continue;
        }

        let url = match base.join(href) {
            Ok(link) => link.to_string(),
            Err(e) => {
                warn!(%href, %name, error = %e, "skipping anchor with malformed href");
                continue;
            }
        };

        if let Some(id) = TABLE_ID.captures(href).and_then(|c| c.get(1)) {
            if !seen_ids.insert(id.as_str().to_string()) {
                continue;
            }
        }

        museums.push(MuseumListing { name, url });
    }

    Ok(museums)
}

/// Visible text of a page, one trimmed text node per line.
/// `script` and `style` contents are dropped.
pub fn flatten_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in doc.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style"))
        });
        if hidden {
            continue;
        }
        let line = text.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
