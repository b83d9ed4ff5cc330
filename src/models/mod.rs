pub mod api;
pub mod scrape;
pub mod ships;
