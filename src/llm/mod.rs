//! Text generation abstraction layer
//!
//! A trait-based seam over the language model so that planning, analysis and
//! report writing can run against GenAI providers, recordings, or scripted
//! mocks interchangeably.

mod client;
mod error;
mod genai;
mod mock;
mod recording;
mod selector;
pub mod structured;
mod types;

pub use client::TextGeneration;
pub use error::GenerationError;
pub use genai::{GenAITextGeneration, API_BASE_URL_ENV};
pub use mock::{MockGeneration, MockStream, MockTextGeneration};
pub use recording::{
    RecordedExchange, RecordedRequest, RecordingMode, RecordingTextGeneration,
};
pub use selector::{select_text_generation, SelectedClient};
pub use structured::{
    check_range, extract_json_from_response, generate_validated, ContractViolation,
    StructuredError, Validate,
};
pub use types::{ChatMessage, GenerationRequest, MessageRole, TokenStream};
