//! Text generation errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised by a text generation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationError {
    /// Provider request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// The provider answered but the payload was not usable
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Missing credentials, bad endpoint, unknown model
    ConfigurationError { message: String },

    /// The token stream broke off mid-way
    StreamError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl GenerationError {
    pub fn invalid_response(message: impl Into<String>, raw: Option<String>) -> Self {
        GenerationError::InvalidResponse {
            message: message.into(),
            raw_response: raw,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::TimeoutError { .. })
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            GenerationError::TimeoutError { seconds } => {
                write!(f, "Generation timed out after {} seconds", seconds)
            }
            GenerationError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from model: {}", message)
            }
            GenerationError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            GenerationError::StreamError { message } => {
                write!(f, "Stream error: {}", message)
            }
            GenerationError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for GenerationError {}
