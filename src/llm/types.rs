//! Text generation request types
//!
//! Provider-independent shapes for structured generation requests and
//! free-form chat transcripts.

use super::error::GenerationError;
use futures_util::stream::Stream;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// User message
    User,
    /// Assistant (model) response
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A structured generation request: instructions, a prompt and the JSON
/// Schema the answer must conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System instructions
    pub system: String,
    /// Task prompt
    pub prompt: String,
    /// Name used for the schema in provider response-format options
    pub schema_name: String,
    /// JSON Schema of the expected answer
    pub schema: serde_json::Value,
    /// Sampling temperature (0.0 - 1.0)
    pub temperature: Option<f32>,
    /// Correction appended when a previous answer broke the contract
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair_note: Option<String>,
}

impl GenerationRequest {
    /// Creates a request whose schema is derived from `T`
    pub fn for_type<T: JsonSchema>(schema_name: impl Into<String>) -> Self {
        let schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
        Self {
            system: String::new(),
            prompt: String::new(),
            schema_name: schema_name.into(),
            schema,
            temperature: None,
            repair_note: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_repair_note(mut self, note: impl Into<String>) -> Self {
        self.repair_note = Some(note.into());
        self
    }

    /// Flattens the request into a chat transcript
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(3);
        if !self.system.is_empty() {
            messages.push(ChatMessage::system(&self.system));
        }
        messages.push(ChatMessage::user(&self.prompt));
        if let Some(note) = &self.repair_note {
            messages.push(ChatMessage::user(note));
        }
        messages
    }
}

/// Incremental text chunks produced by `stream_text`
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(JsonSchema, Deserialize)]
    #[allow(dead_code)]
    struct Probe {
        name: String,
        score: f64,
    }

    #[test]
    fn test_chat_message_creation() {
        let system = ChatMessage::system("You are a research assistant");
        assert_eq!(system.role, MessageRole::System);

        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.content, "Hello");
    }

    #[test]
    fn test_schema_derived_from_type() {
        let request = GenerationRequest::for_type::<Probe>("probe");
        assert_eq!(request.schema_name, "probe");
        let properties = &request.schema["properties"];
        assert!(properties.get("name").is_some());
        assert!(properties.get("score").is_some());
    }

    #[test]
    fn test_messages_include_repair_note() {
        let request = GenerationRequest::for_type::<Probe>("probe")
            .with_system("sys")
            .with_prompt("do it")
            .with_repair_note("score must be within [0, 1]");

        let messages = request.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[2].content, "score must be within [0, 1]");
    }

    #[test]
    fn test_messages_without_system() {
        let request = GenerationRequest::for_type::<Probe>("probe").with_prompt("only prompt");
        let messages = request.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
    }
}
