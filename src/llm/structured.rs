//! Schema-checked structured generation
//!
//! Model answers are deserialized into a typed value and then checked with
//! [`Validate`]. A broken answer earns exactly one repair attempt: the same
//! request is re-sent with a note describing what was wrong.

use super::client::TextGeneration;
use super::error::GenerationError;
use super::types::GenerationRequest;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

const MAX_ATTEMPTS: usize = 2;

/// A value that parsed but broke a range or cardinality rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    pub field: String,
    pub message: String,
}

impl ContractViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Semantic checks that a JSON Schema cannot express on its own
pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

/// Checks that `value` lies in `[min, max]`
pub fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<(), ContractViolation>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if value < min || value > max {
        return Err(ContractViolation::new(
            field,
            format!("{} is outside [{}, {}]", value, min, max),
        ));
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum StructuredError {
    #[error("{schema}: generation failed: {source}")]
    Generation {
        schema: String,
        #[source]
        source: GenerationError,
    },

    #[error("{schema}: answer does not match schema: {message}")]
    Parse { schema: String, message: String },

    #[error("{schema}: answer violates contract: {violation}")]
    Contract {
        schema: String,
        violation: ContractViolation,
    },
}

impl StructuredError {
    pub fn schema(&self) -> &str {
        match self {
            StructuredError::Generation { schema, .. }
            | StructuredError::Parse { schema, .. }
            | StructuredError::Contract { schema, .. } => schema,
        }
    }

    fn repair_note(&self) -> String {
        let problem = match self {
            StructuredError::Generation { source, .. } => source.to_string(),
            StructuredError::Parse { message, .. } => message.clone(),
            StructuredError::Contract { violation, .. } => violation.to_string(),
        };
        format!(
            "Your previous answer was rejected ({}). Reply again with a single JSON object \
             that matches the schema exactly, respecting every numeric range.",
            problem
        )
    }
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Pulls a JSON document out of free-form model output.
///
/// Accepts bare JSON, fenced ```json blocks, and JSON surrounded by prose.
pub fn extract_json_from_response(content: &str) -> Option<serde_json::Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    for fence in ["```json", "```"] {
        if let Some(start_idx) = trimmed.find(fence) {
            let after_fence = &trimmed[start_idx + fence.len()..];
            if let Some(end_idx) = after_fence.find("```") {
                if let Ok(value) = serde_json::from_str(after_fence[..end_idx].trim()) {
                    return Some(value);
                }
            }
        }
    }

    json_object_regex()
        .find(trimmed)
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
}

fn decode<T>(schema: &str, value: serde_json::Value) -> Result<T, StructuredError>
where
    T: DeserializeOwned + Validate,
{
    let value = match value {
        serde_json::Value::String(text) => {
            extract_json_from_response(&text).ok_or_else(|| StructuredError::Parse {
                schema: schema.to_string(),
                message: "answer contains no JSON object".to_string(),
            })?
        }
        other => other,
    };

    let parsed: T = serde_json::from_value(value).map_err(|e| StructuredError::Parse {
        schema: schema.to_string(),
        message: e.to_string(),
    })?;

    parsed
        .validate()
        .map_err(|violation| StructuredError::Contract {
            schema: schema.to_string(),
            violation,
        })?;

    Ok(parsed)
}

/// Generates a `T`, retrying once with a repair note when the first answer
/// fails (transport error, malformed JSON, or contract violation).
pub async fn generate_validated<T>(
    client: &dyn TextGeneration,
    request: GenerationRequest,
) -> Result<T, StructuredError>
where
    T: DeserializeOwned + Validate,
{
    let schema = request.schema_name.clone();
    let mut request = request;
    let mut last_error = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let outcome = match client.generate(request.clone()).await {
            Ok(value) => decode::<T>(&schema, value),
            Err(source) => Err(StructuredError::Generation {
                schema: schema.clone(),
                source,
            }),
        };

        match outcome {
            Ok(parsed) => {
                debug!(schema = %schema, attempt, "Structured generation succeeded");
                return Ok(parsed);
            }
            Err(e) => {
                warn!(schema = %schema, attempt, error = %e, "Structured generation rejected");
                request = request.with_repair_note(e.repair_note());
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(StructuredError::Parse {
        schema,
        message: "no attempt was made".to_string(),
    }))
}
