use super::client::TextGeneration;
use super::error::GenerationError;
use super::types::{ChatMessage, GenerationRequest, TokenStream};
use async_trait::async_trait;
use futures_util::stream;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Queue-driven text generation double.
///
/// Structured answers and text streams are served from two FIFO queues, in
/// the order the pipeline asks for them.
pub struct MockTextGeneration {
    responses: Mutex<VecDeque<MockGeneration>>,
    streams: Mutex<VecDeque<MockStream>>,
    requests: Mutex<Vec<GenerationRequest>>,
    name: String,
}

#[derive(Debug, Clone)]
pub struct MockGeneration {
    pub value: serde_json::Value,
    pub error: Option<GenerationError>,
    pub delay: Option<Duration>,
}

impl MockGeneration {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            value,
            error: None,
            delay: None,
        }
    }

    pub fn error(error: GenerationError) -> Self {
        Self {
            value: serde_json::Value::Null,
            error: Some(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MockStream {
    pub chunks: Vec<String>,
    pub error: Option<GenerationError>,
}

impl MockStream {
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        let chunks = text
            .split_inclusive(' ')
            .map(|chunk| chunk.to_string())
            .collect();
        Self {
            chunks,
            error: None,
        }
    }

    pub fn error(error: GenerationError) -> Self {
        Self {
            chunks: Vec::new(),
            error: Some(error),
        }
    }
}

impl MockTextGeneration {
    pub fn new() -> Self {
        Self::with_name("MockTextGeneration")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            name: name.into(),
        }
    }

    pub fn add_response(&self, response: MockGeneration) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockGeneration>) {
        let mut queue = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        for response in responses {
            queue.push_back(response);
        }
    }

    pub fn add_stream(&self, stream: MockStream) {
        self.streams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(stream);
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Every structured request received so far, in order
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockTextGeneration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGeneration for MockTextGeneration {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<serde_json::Value, GenerationError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let response = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| GenerationError::Other {
                message: "MockTextGeneration: No more responses in queue".to_string(),
            })?;

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        match response.error {
            Some(error) => Err(error),
            None => Ok(response.value),
        }
    }

    async fn stream_text(
        &self,
        _system: &str,
        _messages: Vec<ChatMessage>,
    ) -> Result<TokenStream, GenerationError> {
        let mock = self
            .streams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| GenerationError::Other {
                message: "MockTextGeneration: No more streams in queue".to_string(),
            })?;

        if let Some(error) = mock.error {
            return Err(error);
        }

        let chunks: Vec<Result<String, GenerationError>> =
            mock.chunks.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(chunks)))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model_info(&self) -> Option<String> {
        Some("mock-model".to_string())
    }
}

impl std::fmt::Debug for MockTextGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTextGeneration")
            .field("name", &self.name)
            .field("remaining_responses", &self.remaining_responses())
            .finish()
    }
}
