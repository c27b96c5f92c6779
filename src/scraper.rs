//! Web page loading and visible-text extraction.
//!
//! Uses reqwest for fetching and scraper for HTML parsing.

use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// User-Agent string identifying this loader
const USER_AGENT: &str = concat!("azsum/", env!("CARGO_PKG_VERSION"));

/// Elements whose text is never rendered
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

#[derive(Error, Debug)]
pub enum ContentFetchError {
    #[error("failed to load content from {url}: invalid URL: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to load content from {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to load content from {url}: HTTP {status}")]
    Status { url: String, status: StatusCode },
}

impl ContentFetchError {
    /// The URL that failed to load
    pub fn url(&self) -> &str {
        match self {
            ContentFetchError::InvalidUrl { url, .. }
            | ContentFetchError::Request { url, .. }
            | ContentFetchError::Status { url, .. } => url,
        }
    }
}

/// Extracted content from a webpage
#[derive(Debug, Clone)]
pub struct WebContent {
    /// The requested URL
    pub url: String,
    /// Page title
    pub title: Option<String>,
    /// Visible text, whitespace-collapsed
    pub text: String,
}

/// Fetches pages and flattens them to plain text.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    client: Client,
}

impl ContentLoader {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch `url` and return only its visible text
    pub async fn load(&self, url: &str) -> Result<String, ContentFetchError> {
        Ok(self.fetch(url).await?.text)
    }

    /// Fetch and extract content from a URL
    pub async fn fetch(&self, url: &str) -> Result<WebContent, ContentFetchError> {
        let parsed = url::Url::parse(url).map_err(|source| ContentFetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        debug!(%url, "fetching page");
        let request_error = |source| ContentFetchError::Request {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(parsed).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentFetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let html = response.text().await.map_err(request_error)?;
        let document = Html::parse_document(&html);
        let title = extract_title(&document);
        let text = extract_visible_text(&document);
        info!(%url, chars = text.len(), "extracted page text");

        Ok(WebContent {
            url: url.to_string(),
            title,
            text,
        })
    }
}

/// Extract the page title from <title> or <h1>
pub fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"].into_iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        let element = document.select(&selector).next()?;
        let title = collapse_whitespace(&element.text().collect::<String>());
        (!title.is_empty()).then_some(title)
    })
}

/// Every rendered text node, trimmed and joined with single spaces
pub fn extract_visible_text(document: &Html) -> String {
    let root = document.root_element();
    let mut parts: Vec<&str> = Vec::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| HIDDEN_ELEMENTS.contains(&el.value().name()));
        if hidden {
            continue;
        }
        parts.extend(text.split_whitespace());
    }

    parts.join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
