use async_trait::async_trait;
use genai::{
    chat::{ChatMessage, ChatOptions, ChatRequest},
    Client, ClientBuilder,
};
use std::sync::Arc;

use super::AiClient;
use crate::errors::AppError;

// Low temperature keeps answers factual; the cap bounds answer length.
const GENERATION_TEMPERATURE: f64 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 500;

/// Wrapper struct around the genai::Client to implement our AiClient trait.
pub struct HangarGeminiClient {
    inner: Client,
}

#[async_trait]
impl AiClient for HangarGeminiClient {
    async fn generate(&self, model_name: &str, prompt: &str) -> Result<String, AppError> {
        let request =
            ChatRequest::default().append_message(ChatMessage::user(prompt.to_string()));
        let options = ChatOptions::default()
            .with_temperature(GENERATION_TEMPERATURE)
            .with_max_tokens(MAX_OUTPUT_TOKENS);

        tracing::debug!(%model_name, "Executing chat request");
        let response = self
            .inner
            .exec_chat(model_name, request, Some(&options))
            .await
            .map_err(|e| AppError::LlmError(e.to_string()))?;

        let content = response
            .content_text_as_str()
            .ok_or_else(|| AppError::LlmError("No text content in LLM response".to_string()))?
            .to_string();
        Ok(content)
    }
}

#[async_trait]
impl AiClient for Arc<HangarGeminiClient> {
    async fn generate(&self, model_name: &str, prompt: &str) -> Result<String, AppError> {
        (**self).generate(model_name, prompt).await
    }
}

/// Builds the HangarGeminiClient wrapper. The API key is picked up from the
/// GEMINI_API_KEY environment variable by the genai auth resolver.
pub fn build_gemini_client() -> Result<Arc<HangarGeminiClient>, AppError> {
    let client = ClientBuilder::default().build();
    Ok(Arc::new(HangarGeminiClient { inner: client }))
}
