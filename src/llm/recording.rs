//! Text generation recording for deterministic runs

use super::client::TextGeneration;
use super::error::GenerationError;
use super::types::{ChatMessage, GenerationRequest, TokenStream};
use anyhow::{Context, Result};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const STREAM_SCHEMA_NAME: &str = "stream_text";

/// Recording mode for model interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingMode {
    /// Call the model and save every exchange to disk
    Record,
    /// Serve recorded exchanges only, fail if one is missing
    Replay,
    /// Replay if a recording exists, otherwise record
    Auto,
}

impl RecordingMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "record" => Ok(RecordingMode::Record),
            "replay" => Ok(RecordingMode::Replay),
            "auto" => Ok(RecordingMode::Auto),
            _ => anyhow::bail!("Invalid recording mode: {}", s),
        }
    }

    /// Reads `DELVE_RECORDING_MODE`, falling back to `default`
    pub fn from_env(default: RecordingMode) -> RecordingMode {
        std::env::var("DELVE_RECORDING_MODE")
            .ok()
            .and_then(|s| Self::parse(&s).ok())
            .unwrap_or(default)
    }
}

/// A recorded request-response exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedExchange {
    /// Canonical hash of the request (MD5)
    pub request_hash: String,
    pub request: RecordedRequest,
    /// Structured answer, or the full text for streamed exchanges
    pub response: serde_json::Value,
    /// Timestamp when recorded (RFC 3339)
    pub recorded_at: String,
}

/// The parts of a request that determine its answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedRequest {
    pub schema_name: String,
    pub messages: Vec<ChatMessage>,
    pub schema: serde_json::Value,
}

impl RecordedRequest {
    pub fn from_generation_request(req: &GenerationRequest) -> Self {
        Self {
            schema_name: req.schema_name.clone(),
            messages: req.messages(),
            schema: req.schema.clone(),
        }
    }

    pub fn from_stream(system: &str, messages: &[ChatMessage]) -> Self {
        let mut all = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            all.push(ChatMessage::system(system));
        }
        all.extend_from_slice(messages);
        Self {
            schema_name: STREAM_SCHEMA_NAME.to_string(),
            messages: all,
            schema: serde_json::Value::Null,
        }
    }

    /// MD5 of the canonical JSON form
    pub fn canonical_hash(&self) -> String {
        let canonical_json = serde_json::to_string(self).unwrap_or_default();
        format!("{:x}", md5::compute(canonical_json.as_bytes()))
    }
}

/// Text generation wrapper that records or replays exchanges
pub struct RecordingTextGeneration {
    inner: Arc<dyn TextGeneration>,
    mode: RecordingMode,
    recordings_dir: PathBuf,
    cache: HashMap<String, serde_json::Value>,
}

impl RecordingTextGeneration {
    pub fn new(
        inner: Arc<dyn TextGeneration>,
        mode: RecordingMode,
        recordings_dir: PathBuf,
    ) -> Result<Self> {
        std::fs::create_dir_all(&recordings_dir)
            .context("Failed to create recordings directory")?;

        Ok(Self {
            inner,
            mode,
            recordings_dir,
            cache: HashMap::new(),
        })
    }

    /// Mode from `DELVE_RECORDING_MODE`, directory from `DELVE_RECORDINGS_DIR`
    pub fn from_env(inner: Arc<dyn TextGeneration>) -> Result<Self> {
        let mode = RecordingMode::from_env(RecordingMode::Auto);
        let recordings_dir = std::env::var("DELVE_RECORDINGS_DIR")
            .unwrap_or_else(|_| "tests/recordings".to_string())
            .into();

        Self::new(inner, mode, recordings_dir)
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    fn recording_path(&self, request_hash: &str) -> PathBuf {
        self.recordings_dir.join(format!("{}.json", request_hash))
    }

    fn load_recording(&self, request_hash: &str) -> Result<Option<serde_json::Value>> {
        let path = self.recording_path(request_hash);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read recording: {}", path.display()))?;

        let exchange: RecordedExchange = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse recording: {}", path.display()))?;

        Ok(Some(exchange.response))
    }

    fn save_recording(&self, request: &RecordedRequest, response: &serde_json::Value) -> Result<()> {
        let request_hash = request.canonical_hash();

        let exchange = RecordedExchange {
            request_hash: request_hash.clone(),
            request: request.clone(),
            response: response.clone(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        };

        let path = self.recording_path(&request_hash);
        let contents =
            serde_json::to_string_pretty(&exchange).context("Failed to serialize recording")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write recording: {}", path.display()))?;

        debug!("Saved recording {}", path.display());
        Ok(())
    }

    /// Load all recordings into cache
    pub fn preload_cache(&mut self) -> Result<()> {
        if !self.recordings_dir.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(&self.recordings_dir)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let contents = std::fs::read_to_string(&path)?;
            let exchange: RecordedExchange = serde_json::from_str(&contents)?;

            self.cache.insert(exchange.request_hash, exchange.response);
        }

        Ok(())
    }

    fn lookup(&self, request_hash: &str) -> Result<Option<serde_json::Value>, GenerationError> {
        if let Some(response) = self.cache.get(request_hash) {
            return Ok(Some(response.clone()));
        }

        self.load_recording(request_hash)
            .map_err(|e| GenerationError::Other {
                message: format!("Failed to load recording: {}", e),
            })
    }

    fn save(&self, request: &RecordedRequest, response: &serde_json::Value) -> Result<(), GenerationError> {
        self.save_recording(request, response)
            .map_err(|e| GenerationError::Other {
                message: format!("Failed to save recording: {}", e),
            })
    }

    fn missing(request_hash: &str) -> GenerationError {
        GenerationError::Other {
            message: format!(
                "No recording found for request hash: {} (mode: Replay)",
                request_hash
            ),
        }
    }
}

fn replay_stream(text: String) -> TokenStream {
    Box::pin(stream::once(async move { Ok(text) }))
}

#[async_trait::async_trait]
impl TextGeneration for RecordingTextGeneration {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<serde_json::Value, GenerationError> {
        let recorded_request = RecordedRequest::from_generation_request(&request);
        let request_hash = recorded_request.canonical_hash();

        if self.mode != RecordingMode::Record {
            if let Some(response) = self.lookup(&request_hash)? {
                return Ok(response);
            }
            if self.mode == RecordingMode::Replay {
                return Err(Self::missing(&request_hash));
            }
        }

        let response = self.inner.generate(request).await?;
        self.save(&recorded_request, &response)?;
        Ok(response)
    }

    async fn stream_text(
        &self,
        system: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<TokenStream, GenerationError> {
        let recorded_request = RecordedRequest::from_stream(system, &messages);
        let request_hash = recorded_request.canonical_hash();

        if self.mode != RecordingMode::Record {
            if let Some(response) = self.lookup(&request_hash)? {
                let text = response.as_str().unwrap_or_default().to_string();
                return Ok(replay_stream(text));
            }
            if self.mode == RecordingMode::Replay {
                return Err(Self::missing(&request_hash));
            }
        }

        let mut inner = self.inner.stream_text(system, messages).await?;
        let mut text = String::new();
        while let Some(chunk) = inner.next().await {
            text.push_str(&chunk?);
        }

        self.save(&recorded_request, &serde_json::Value::String(text.clone()))?;
        Ok(replay_stream(text))
    }

    fn name(&self) -> &str {
        "RecordingTextGeneration"
    }

    fn model_info(&self) -> Option<String> {
        self.inner.model_info()
    }
}
