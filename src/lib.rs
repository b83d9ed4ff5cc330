pub mod config;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

// Re-export AppState for convenience.
pub use state::AppState;
