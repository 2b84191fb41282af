//! Model page scraping.
//!
//! Fetches a project page over plain HTTP and pulls three things out of the
//! static HTML: the project name, the topic tags, and the README text. The
//! hub renders these server-side, so no browser automation is needed.
//!
//! HTML parsing happens in a synchronous helper because `scraper::Html` is
//! not `Send` and must not be held across an await point.

use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use super::record::{truncate_chars, ModelRecord};
use crate::error::IngestError;

/// Cap on README characters kept from a page.
const README_MAX_CHARS: usize = 5000;
/// Cap on tags kept from a page.
const TAGS_MAX: usize = 15;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Scrapes model project pages for README and tags.
pub struct PageScraper {
    http_client: Client,
    /// Optional hub auth token, sent as a bearer header.
    token: Option<String>,
}

impl PageScraper {
    /// Create a scraper, optionally authenticated.
    pub fn new(token: Option<String>) -> Self {
        Self {
            http_client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            token,
        }
    }

    /// Fetch and parse one project page.
    pub async fn scrape(&self, url: &str) -> Result<ModelRecord, IngestError> {
        debug!(url, "Fetching project page");

        let mut request = self.http_client.get(url);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| IngestError::FetchFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::FetchFailed {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let html = response.text().await.map_err(|e| IngestError::FetchFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        parse_page(url, &html)
    }

    /// Fetch and parse one project page, degrading to a content-free record
    /// on failure. Scrape failures cost one model's README, never the run.
    pub async fn scrape_lossy(&self, url: &str, fallback_name: &str) -> ModelRecord {
        match self.scrape(url).await {
            Ok(record) => record,
            Err(e) => {
                warn!(url, error = %e, "Scrape failed, continuing without page content");
                ModelRecord::bare(url, fallback_name)
            }
        }
    }
}

impl Default for PageScraper {
    fn default() -> Self {
        Self::new(None)
    }
}

fn selector(css: &str) -> Result<Selector, IngestError> {
    Selector::parse(css).map_err(|_| IngestError::InvalidSelector(css.to_string()))
}

/// Extract name, tags, and README from page HTML.
fn parse_page(url: &str, html: &str) -> Result<ModelRecord, IngestError> {
    let document = Html::parse_document(html);

    let project_name = extract_name(url, &document)?;
    let tags = extract_tags(&document)?;
    let readme = extract_readme(&document)?;

    debug!(
        url,
        tags = tags.len(),
        readme_chars = readme.chars().count(),
        "Parsed project page"
    );

    Ok(ModelRecord {
        url: url.to_string(),
        project_name,
        readme,
        tags,
    })
}

/// Project name: `org/repo` from the URL when the path allows, otherwise the
/// breadcrumb text, otherwise "Unknown".
fn extract_name(url: &str, document: &Html) -> Result<String, IngestError> {
    let url_parts: Vec<&str> = url
        .trim_end_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    // scheme + host + org + repo
    if url_parts.len() >= 4 {
        return Ok(format!(
            "{}/{}",
            url_parts[url_parts.len() - 2],
            url_parts[url_parts.len() - 1]
        ));
    }

    let breadcrumb = selector("div.breadcrumb p a span.linkTx")?;
    if let Some(element) = document.select(&breadcrumb).next() {
        let text = element.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return Ok(text);
        }
    }

    Ok("Unknown".to_string())
}

/// Tags: topic-tag spans, with generic tag/label/badge classes as fallback.
fn extract_tags(document: &Html) -> Result<Vec<String>, IngestError> {
    let primary = selector("div.topic-tag span")?;
    let fallback = selector(".tag, .label, .badge")?;

    let mut tags: Vec<String> = document
        .select(&primary)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if tags.is_empty() {
        tags = document
            .select(&fallback)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }

    tags.dedup();
    tags.truncate(TAGS_MAX);
    Ok(tags)
}

/// README: the hub's markdown preview container, with generic readme and
/// markdown containers as fallback.
fn extract_readme(document: &Html) -> Result<String, IngestError> {
    let candidates = [
        "div[class*=\"dp-editor-md-preview-container\"]",
        ".markdown-body",
        "#readme",
        "div[class*=\"readme\"]",
        "div[class*=\"markdown\"]",
        "article",
    ];

    for css in candidates {
        let sel = selector(css)?;
        if let Some(element) = document.select(&sel).next() {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                return Ok(truncate_chars(&text, README_MAX_CHARS).to_string());
            }
        }
    }

    Ok(String::new())
}
