use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Config {
    // API keys
    pub gemini_api_key: Option<String>,

    // Server config
    #[serde(default = "default_port")]
    pub port: u16,

    // Dataset files
    #[serde(default = "default_ship_data_file")]
    pub ship_data_file: String,
    #[serde(default = "default_enriched_data_file")]
    pub enriched_data_file: String,

    // Price cache
    #[serde(default = "default_price_cache_file")]
    pub price_cache_file: String,
    #[serde(default = "default_price_cache_ttl_hours")]
    pub price_cache_ttl_hours: i64,

    // Scraper
    #[serde(default = "default_scrape_max_workers")]
    pub scrape_max_workers: usize,
    #[serde(default = "default_scrape_timeout_secs")]
    pub scrape_timeout_secs: u64,

    // Model configuration
    #[serde(default = "default_chat_model")]
    pub chat_model: String, // Main model for answer generation
    #[serde(default = "default_fast_model")]
    pub fast_model: String, // Lite model for resolution/classification

    // Answer flow
    #[serde(default = "default_legacy_fallback")]
    pub legacy_fallback: bool, // Two-round structured-then-scrape mode
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("port", &self.port)
            .field("ship_data_file", &self.ship_data_file)
            .field("enriched_data_file", &self.enriched_data_file)
            .field("price_cache_file", &self.price_cache_file)
            .field("price_cache_ttl_hours", &self.price_cache_ttl_hours)
            .field("scrape_max_workers", &self.scrape_max_workers)
            .field("scrape_timeout_secs", &self.scrape_timeout_secs)
            .field("chat_model", &self.chat_model)
            .field("fast_model", &self.fast_model)
            .field("legacy_fallback", &self.legacy_fallback)
            .finish()
    }
}

const fn default_port() -> u16 {
    8080
}
fn default_ship_data_file() -> String {
    "data/starships.json".to_string()
}
fn default_enriched_data_file() -> String {
    "data/ship_details.json".to_string()
}
fn default_price_cache_file() -> String {
    "cache/price_data.json".to_string()
}
const fn default_price_cache_ttl_hours() -> i64 {
    24
}
const fn default_scrape_max_workers() -> usize {
    3
}
const fn default_scrape_timeout_secs() -> u64 {
    10
}
fn default_chat_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_fast_model() -> String {
    "gemini-2.0-flash-lite".to_string()
}
const fn default_legacy_fallback() -> bool {
    false
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `anyhow::Error` if environment variable parsing fails,
    /// such as when variables have invalid formats.
    pub fn load() -> Result<Self, anyhow::Error> {
        envy::from_env::<Self>().map_err(anyhow::Error::from)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            port: default_port(),
            ship_data_file: default_ship_data_file(),
            enriched_data_file: default_enriched_data_file(),
            price_cache_file: default_price_cache_file(),
            price_cache_ttl_hours: default_price_cache_ttl_hours(),
            scrape_max_workers: default_scrape_max_workers(),
            scrape_timeout_secs: default_scrape_timeout_secs(),
            chat_model: default_chat_model(),
            fast_model: default_fast_model(),
            legacy_fallback: default_legacy_fallback(),
        }
    }
}
