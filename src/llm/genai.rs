//! GenAI-based text generation
//!
//! Wraps the `genai` crate so any of its providers (Ollama, OpenAI, Claude,
//! Gemini, Groq, ...) can plan, analyze and write reports.

use super::client::TextGeneration;
use super::error::GenerationError;
use super::structured::extract_json_from_response;
use super::types::{ChatMessage, GenerationRequest, MessageRole, TokenStream};
use async_trait::async_trait;
use futures_util::StreamExt;
use genai::adapter::AdapterKind;
use genai::chat::{
    ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest,
    ChatResponseFormat, ChatStreamEvent, JsonSpec,
};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::Duration;
use tracing::{debug, error};

/// Environment variable overriding the provider endpoint
pub const API_BASE_URL_ENV: &str = "DELVE_API_BASE_URL";

pub struct GenAITextGeneration {
    client: Client,
    model: String,
    provider: AdapterKind,
    timeout: Duration,
}

impl GenAITextGeneration {
    /// Creates a client for `model` served by `provider`.
    ///
    /// When `DELVE_API_BASE_URL` is set every request is routed there,
    /// authenticated with the provider's usual key variable.
    pub fn new(
        provider: AdapterKind,
        model: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        if model.trim().is_empty() {
            return Err(GenerationError::ConfigurationError {
                message: "model name must not be empty".to_string(),
            });
        }

        let custom_endpoint = std::env::var(API_BASE_URL_ENV).ok();

        let client = if let Some(endpoint_url) = custom_endpoint {
            debug!(
                "Using custom endpoint for {}: {}",
                provider.as_str(),
                endpoint_url
            );

            let model_clone = model.clone();
            let resolver = ServiceTargetResolver::from_resolver_fn(
                move |_service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error>
                {
                    let auth = match provider.default_key_env_name() {
                        Some(api_key_var) => AuthData::from_env(api_key_var),
                        None => AuthData::from_single(""),
                    };

                    Ok(ServiceTarget {
                        endpoint: Endpoint::from_owned(endpoint_url.clone()),
                        auth,
                        model: ModelIden::new(provider, &model_clone),
                    })
                },
            );

            Client::builder()
                .with_service_target_resolver(resolver)
                .build()
        } else {
            Client::default()
        };

        debug!(
            "Creating GenAI text generation: provider={}, model={}",
            provider.as_str(),
            model,
        );

        Ok(Self {
            client,
            model,
            provider,
            timeout,
        })
    }

    fn convert_message(msg: &ChatMessage) -> GenAIChatMessage {
        match msg.role {
            MessageRole::System => GenAIChatMessage::system(&msg.content),
            MessageRole::User => GenAIChatMessage::user(&msg.content),
            MessageRole::Assistant => GenAIChatMessage::assistant(&msg.content),
        }
    }

    fn build_request(system: &str, messages: &[ChatMessage]) -> GenAIChatRequest {
        let converted: Vec<GenAIChatMessage> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(Self::convert_message)
            .collect();

        let mut request = GenAIChatRequest::new(converted);
        let system = messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .unwrap_or(system);
        if !system.is_empty() {
            request = request.with_system(system);
        }
        request
    }

    fn api_error(&self, e: impl std::fmt::Display) -> GenerationError {
        error!("{} API error: {}", self.provider.as_str(), e);
        GenerationError::ApiError {
            message: format!("{} request failed: {}", self.provider.as_str(), e),
            status_code: None,
        }
    }

    fn timeout_error(&self) -> GenerationError {
        error!(
            "{} request timed out after {}s",
            self.provider.as_str(),
            self.timeout.as_secs()
        );
        GenerationError::TimeoutError {
            seconds: self.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl TextGeneration for GenAITextGeneration {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<serde_json::Value, GenerationError> {
        let start = std::time::Instant::now();
        let genai_request = Self::build_request(&request.system, &request.messages());

        let mut options = ChatOptions::default().with_response_format(
            ChatResponseFormat::JsonSpec(JsonSpec::new(
                request.schema_name.clone(),
                request.schema.clone(),
            )),
        );
        if let Some(temp) = request.temperature {
            options = options.with_temperature(temp as f64);
        }

        let response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat(&self.model, genai_request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(self.api_error(e)),
            Err(_) => return Err(self.timeout_error()),
        };

        let content = response.first_text().unwrap_or_default().to_string();
        debug!(
            schema = %request.schema_name,
            latency_ms = start.elapsed().as_millis() as u64,
            "{} answered ({} chars)",
            self.provider.as_str(),
            content.len()
        );

        extract_json_from_response(&content).ok_or_else(|| {
            GenerationError::invalid_response(
                format!("no JSON object in {} answer", request.schema_name),
                Some(content),
            )
        })
    }

    async fn stream_text(
        &self,
        system: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<TokenStream, GenerationError> {
        let genai_request = Self::build_request(system, &messages);

        let response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat_stream(&self.model, genai_request, None),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(self.api_error(e)),
            Err(_) => return Err(self.timeout_error()),
        };

        let chunks = response.stream.filter_map(|event| async move {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => Some(Ok(chunk.content)),
                Ok(_) => None,
                Err(e) => Some(Err(GenerationError::StreamError {
                    message: e.to_string(),
                })),
            }
        });

        Ok(Box::pin(chunks))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAITextGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAITextGeneration")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genai_client_creation() {
        let client = GenAITextGeneration::new(
            AdapterKind::Ollama,
            "qwen2.5-coder:14b".to_string(),
            Duration::from_secs(30),
        )
        .unwrap();

        assert_eq!(client.name(), "Ollama");
        assert_eq!(client.model_info(), Some("qwen2.5-coder:14b".to_string()));
    }

    #[test]
    fn test_empty_model_rejected() {
        let result =
            GenAITextGeneration::new(AdapterKind::Ollama, "  ".to_string(), Duration::from_secs(5));
        assert!(matches!(
            result,
            Err(GenerationError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_debug_impl() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<GenAITextGeneration>();
    }
}
