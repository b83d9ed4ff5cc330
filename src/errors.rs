use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    // --- Request/Input Errors ---
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    // --- External Service Errors ---
    #[error("LLM API error: {0}")]
    LlmError(String),

    #[error("HTTP Request Error: {0}")]
    HttpRequestError(String),

    #[error("Scrape Error: {0}")]
    ScrapeError(String),

    #[error("Price Refresh Error: {0}")]
    PriceRefreshError(String),

    // --- General/Internal Errors ---
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("Serialization Error: {0}")]
    SerializationError(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpRequestError(err.to_string())
    }
}

// Every error leaves the process as the same {success:false, error} envelope
// the frontend expects. 5xx variants log the detail and surface a generic
// message; 4xx variants carry their specific message through.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // 4xx Client Errors
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid input: {}", msg))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),

            // 5xx Server Errors
            AppError::LlmError(e) => {
                error!("LLM API error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI service error".to_string(),
                )
            }
            AppError::HttpRequestError(e) => {
                error!("HTTP request error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Upstream request error".to_string(),
                )
            }
            AppError::ScrapeError(e) => {
                error!("Scrape error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Page scraping error".to_string(),
                )
            }
            AppError::PriceRefreshError(e) => {
                error!("Price refresh error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Price data error".to_string(),
                )
            }
            AppError::ConfigError(e) => {
                error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
            AppError::IoError(e) => {
                error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "File system or network error".to_string(),
                )
            }
            AppError::SerializationError(e) => {
                error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Data formatting error".to_string(),
                )
            }
            AppError::InternalServerError(e) => {
                error!("Internal server error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
