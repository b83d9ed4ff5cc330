use async_trait::async_trait;

use crate::errors::AppError;

pub mod gemini_client;

/// Trait defining the interface for text-generation operations.
///
/// Everything above this boundary deals in plain prompt/response strings;
/// the genai-specific request plumbing stays inside the implementation, so
/// tests can swap in a stub without touching provider types.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Sends one prompt to the named model and returns the generated text.
    async fn generate(&self, model_name: &str, prompt: &str) -> Result<String, AppError>;
}
