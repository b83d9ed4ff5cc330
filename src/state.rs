use std::sync::Arc;

use crate::config::Config;
use crate::llm::AiClient;
use crate::services::orchestrator::AnswerOrchestrator;
use crate::services::price_cache::PriceCache;
use crate::services::scraper::WebScraper;
use crate::services::ship_store::ShipStore;

/// Shared application state. Every collaborator is constructed once at
/// startup and injected here; request handlers only read.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<ShipStore>,
    pub orchestrator: Arc<AnswerOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<ShipStore>,
        prices: Arc<PriceCache>,
        scraper: Arc<dyn WebScraper>,
        ai_client: Arc<dyn AiClient>,
    ) -> Self {
        let orchestrator = Arc::new(AnswerOrchestrator::new(
            store.clone(),
            prices,
            scraper,
            ai_client,
            config.clone(),
        ));
        Self {
            config,
            store,
            orchestrator,
        }
    }
}
