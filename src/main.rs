use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use hangar_backend::config::Config;
use hangar_backend::llm::gemini_client::build_gemini_client;
use hangar_backend::logging::init_subscriber;
use hangar_backend::routes::api_router;
use hangar_backend::services::price_cache::{HttpPriceSource, PriceCache};
use hangar_backend::services::scraper::{HttpPageFetcher, PageScraper};
use hangar_backend::services::ship_store::ShipStore;
use hangar_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_subscriber();

    let config = Arc::new(Config::load().context("Failed to load configuration")?);
    tracing::info!(?config, "Starting hangar backend server...");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.scrape_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let store = Arc::new(ShipStore::load(
        &config.ship_data_file,
        &config.enriched_data_file,
    ));
    if store.is_empty() {
        tracing::warn!("Ship store is empty; check the dataset files");
    }

    let prices = Arc::new(PriceCache::load(
        &config.price_cache_file,
        config.price_cache_ttl_hours,
        Arc::new(HttpPriceSource::new(http.clone())),
    ));

    let scraper = Arc::new(PageScraper::new(
        Arc::new(HttpPageFetcher::new(http)),
        config.scrape_max_workers,
    ));

    let ai_client = build_gemini_client().context("Failed to build Gemini client")?;

    let state = AppState::new(config.clone(), store, prices, scraper, ai_client);

    let app = api_router(state).layer(
        TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(false)),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Invalid address format")?;
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
