use super::error::GenerationError;
use super::types::{ChatMessage, GenerationRequest, TokenStream};
use async_trait::async_trait;

/// Text generation collaborator.
///
/// `generate` returns a raw JSON value that is expected to match
/// `request.schema`; callers validate it (see [`super::structured`]).
#[async_trait]
pub trait TextGeneration: Send + Sync {
    async fn generate(&self, request: GenerationRequest)
        -> Result<serde_json::Value, GenerationError>;

    async fn stream_text(
        &self,
        system: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<TokenStream, GenerationError>;

    fn name(&self) -> &str;

    fn model_info(&self) -> Option<String> {
        None
    }
}
