use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::errors::AppError;

/// Fixed reference page the price table is scraped from; also used as a
/// citation whenever a cached price backs an answer.
pub const PRICE_LIST_URL: &str = "https://starcitizen.tools/Purchasing_ships";

/// The persisted table: name -> in-game price, plus one freshness stamp
/// shared by the whole table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    pub prices: HashMap<String, i64>,
    pub last_update: DateTime<Utc>,
}

impl Default for PriceTable {
    fn default() -> Self {
        // Epoch stamp forces a refresh on the first read.
        Self {
            prices: HashMap::new(),
            last_update: DateTime::UNIX_EPOCH,
        }
    }
}

/// Source of a fresh price table. Behind a trait so tests stub the network.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self) -> Result<HashMap<String, i64>, AppError>;
}

/// Scrapes the purchasing reference page and parses its first price table.
pub struct HttpPriceSource {
    http: reqwest::Client,
}

impl HttpPriceSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch_prices(&self) -> Result<HashMap<String, i64>, AppError> {
        let response = self.http.get(PRICE_LIST_URL).send().await?;
        if !response.status().is_success() {
            return Err(AppError::PriceRefreshError(format!(
                "Failed to fetch price data: {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        Ok(parse_price_table(&body))
    }
}

/// Parses the first table on the page: rows of manufacturer / ship / base
/// price. Unparseable prices are skipped with a warning, not fatal.
pub fn parse_price_table(html: &str) -> HashMap<String, i64> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").expect("static selector");
    let row_selector = Selector::parse("tr").expect("static selector");
    let cell_selector = Selector::parse("td").expect("static selector");

    let mut prices = HashMap::new();
    let Some(table) = document.select(&table_selector).next() else {
        return prices;
    };

    for row in table.select(&row_selector).skip(1) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < 3 {
            continue;
        }
        let ship_name = cells[1].clone();
        let price_text = cells[2].replace(',', "");
        match price_text.parse::<i64>() {
            Ok(price) => {
                prices.insert(ship_name, price);
            }
            Err(_) => {
                warn!(ship = %ship_name, price = %cells[2], "Could not parse price");
            }
        }
    }
    prices
}

/// Process-wide price cache: read-mostly, with lazy refresh-on-stale-read
/// as its only mutation path. The refresh-then-write sequence runs under
/// the write lock, so concurrent stale reads trigger at most one refresh.
pub struct PriceCache {
    state: RwLock<PriceTable>,
    cache_file: PathBuf,
    ttl: Duration,
    source: Arc<dyn PriceSource>,
}

impl PriceCache {
    /// Loads the persisted table; a missing or corrupt file starts empty
    /// with the epoch stamp.
    pub fn load(
        cache_file: impl AsRef<Path>,
        ttl_hours: i64,
        source: Arc<dyn PriceSource>,
    ) -> Self {
        let cache_file = cache_file.as_ref().to_path_buf();
        let table = match std::fs::read_to_string(&cache_file) {
            Ok(raw) => match serde_json::from_str::<PriceTable>(&raw) {
                Ok(table) => {
                    info!(entries = table.prices.len(), "Price data loaded from cache");
                    table
                }
                Err(e) => {
                    error!(path = %cache_file.display(), "Error parsing price cache: {}", e);
                    PriceTable::default()
                }
            },
            Err(_) => PriceTable::default(),
        };
        Self {
            state: RwLock::new(table),
            cache_file,
            ttl: Duration::hours(ttl_hours),
            source,
        }
    }

    /// In-game price for a ship: exact name first, then case-insensitive.
    /// A stale table gets exactly one refresh attempt first; if that fails
    /// the read still answers from the possibly-stale data. Absence is a
    /// valid outcome, not an error.
    pub async fn get_price(&self, ship_name: &str) -> Option<i64> {
        self.ensure_fresh().await;
        let table = self.state.read().await;
        if let Some(price) = table.prices.get(ship_name) {
            return Some(*price);
        }
        let wanted = ship_name.to_lowercase();
        table
            .prices
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, price)| *price)
    }

    /// All cached prices, with the same staleness handling as `get_price`.
    pub async fn all_prices(&self) -> HashMap<String, i64> {
        self.ensure_fresh().await;
        self.state.read().await.prices.clone()
    }

    /// Explicit refresh: fetches a new table, replaces the map only when
    /// the fetch yielded entries, stamps now, and persists.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let new_prices = self.source.fetch_prices().await?;
        if new_prices.is_empty() {
            warn!("No price data was parsed; keeping previous table");
            return Ok(());
        }
        let mut table = self.state.write().await;
        table.prices = new_prices;
        table.last_update = Utc::now();
        info!(entries = table.prices.len(), "Updated ship prices");
        self.persist(&table);
        Ok(())
    }

    async fn ensure_fresh(&self) {
        {
            let table = self.state.read().await;
            if !self.is_stale(&table) {
                return;
            }
        }
        // Re-check under the write lock; a concurrent reader may have
        // refreshed while we waited.
        let mut table = self.state.write().await;
        if !self.is_stale(&table) {
            return;
        }
        match self.source.fetch_prices().await {
            Ok(new_prices) if !new_prices.is_empty() => {
                table.prices = new_prices;
                table.last_update = Utc::now();
                info!(entries = table.prices.len(), "Updated ship prices");
                self.persist(&table);
            }
            Ok(_) => warn!("No price data was parsed; keeping previous table"),
            // Failed refresh leaves the stamp alone, so the next read
            // retries; the current read proceeds with stale data.
            Err(e) => error!("Error updating price data: {}", e),
        }
    }

    fn is_stale(&self, table: &PriceTable) -> bool {
        Utc::now() - table.last_update > self.ttl
    }

    fn persist(&self, table: &PriceTable) {
        if let Some(parent) = self.cache_file.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("Error creating price cache directory: {}", e);
                return;
            }
        }
        match serde_json::to_string(table) {
            Ok(serialized) => {
                if let Err(e) = std::fs::write(&self.cache_file, serialized) {
                    error!("Error saving price cache: {}", e);
                }
            }
            Err(e) => error!("Error serializing price cache: {}", e),
        }
    }
}
