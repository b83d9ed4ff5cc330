pub mod context;
pub mod orchestrator;
pub mod price_cache;
pub mod resolver;
pub mod scraper;
pub mod ship_store;
pub mod sufficiency;
