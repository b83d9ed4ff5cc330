use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use scraper::{Html, Selector};
use tracing::{debug, error};
use url::Url;

use crate::errors::AppError;
use crate::models::scrape::{PageContent, ScrapeResult};

/// Fetches one URL to an HTML body. Behind a trait so the scrape pipeline
/// is testable without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, AppError>;
}

pub struct HttpPageFetcher {
    http: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let parsed = Url::parse(url)
            .map_err(|e| AppError::ScrapeError(format!("invalid url {url}: {e}")))?;
        let response = self.http.get(parsed).send().await?;
        if !response.status().is_success() {
            return Err(AppError::ScrapeError(format!(
                "Failed to download content: {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

/// The page-scraping collaborator: per-URL structured content plus a
/// bounded-concurrency batch call.
#[async_trait]
pub trait WebScraper: Send + Sync {
    async fn scrape_url(&self, url: &str) -> ScrapeResult;

    /// One result per input URL, in completion order. A failed fetch
    /// becomes that URL's error marker; it never aborts the batch.
    async fn scrape_multiple_urls(&self, urls: &[String]) -> Vec<ScrapeResult>;
}

pub struct PageScraper {
    fetcher: Arc<dyn PageFetcher>,
    max_workers: usize,
}

impl PageScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_workers: usize) -> Self {
        Self {
            fetcher,
            max_workers: max_workers.max(1),
        }
    }
}

#[async_trait]
impl WebScraper for PageScraper {
    async fn scrape_url(&self, url: &str) -> ScrapeResult {
        let content = match self.fetcher.fetch(url).await {
            Ok(body) => parse_page(&body),
            Err(e) => {
                error!(%url, "Error scraping page: {}", e);
                PageContent::error(e)
            }
        };
        ScrapeResult {
            url: url.to_string(),
            content,
        }
    }

    async fn scrape_multiple_urls(&self, urls: &[String]) -> Vec<ScrapeResult> {
        debug!(count = urls.len(), "Scraping URL batch");
        stream::iter(urls.to_vec())
            .map(|url| async move { self.scrape_url(&url).await })
            .buffer_unordered(self.max_workers)
            .collect()
            .await
    }
}

/// Parses an HTML body into structured content: intro text before the
/// first heading, sections keyed by h2/h3 heading, tables as row/cell
/// matrices. A page with no headings and no tables degrades to flat text.
pub fn parse_page(html: &str) -> PageContent {
    let document = Html::parse_document(html);
    let flow_selector = Selector::parse("h2, h3, p, li").expect("static selector");
    let table_selector = Selector::parse("table").expect("static selector");
    let row_selector = Selector::parse("tr").expect("static selector");
    let cell_selector = Selector::parse("th, td").expect("static selector");

    let mut intro = String::new();
    let mut sections: BTreeMap<String, String> = BTreeMap::new();
    let mut current: Option<String> = None;

    for element in document.select(&flow_selector) {
        let tag = element.value().name();
        let text = element.text().collect::<String>().trim().to_string();
        if text.is_empty() {
            continue;
        }
        if tag == "h2" || tag == "h3" {
            // Wiki headings carry an [edit] suffix worth stripping.
            let heading = text.trim_end_matches("[edit]").trim().to_string();
            current = Some(heading);
            continue;
        }
        let bucket = match &current {
            Some(heading) => sections.entry(heading.clone()).or_default(),
            None => &mut intro,
        };
        if !bucket.is_empty() {
            bucket.push('\n');
        }
        bucket.push_str(&text);
    }

    let tables: Vec<Vec<Vec<String>>> = document
        .select(&table_selector)
        .map(|table| {
            table
                .select(&row_selector)
                .map(|row| {
                    row.select(&cell_selector)
                        .map(|cell| cell.text().collect::<String>().trim().to_string())
                        .collect()
                })
                .collect()
        })
        .collect();

    if sections.is_empty() && tables.is_empty() {
        let root_text = document
            .root_element()
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        return PageContent::Flat(root_text);
    }

    PageContent::Structured {
        intro,
        sections,
        tables,
    }
}
