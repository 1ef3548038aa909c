use crate::research::{Depth, StepKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl From<Depth> for SearchDepth {
    fn from(depth: Depth) -> Self {
        match depth {
            Depth::Basic => SearchDepth::Basic,
            Depth::Advanced => SearchDepth::Advanced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    #[default]
    General,
    News,
}

/// Parameters of a single search call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub depth: SearchDepth,
    pub max_results: usize,
    pub topic: Topic,
    /// Restrict news searches to the last N days
    pub days: Option<u32>,
    pub include_domains: Vec<String>,
    pub exclude_domains: Vec<String>,
    pub include_answer: bool,
    pub include_images: bool,
    pub include_image_descriptions: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            depth: SearchDepth::Basic,
            max_results: 10,
            topic: Topic::General,
            days: None,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
            include_answer: true,
            include_images: false,
            include_image_descriptions: false,
        }
    }
}

impl SearchOptions {
    pub fn with_depth(mut self, depth: SearchDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_include_domains(mut self, domains: Vec<String>) -> Self {
        self.include_domains = domains;
        self
    }

    pub fn with_exclude_domains(mut self, domains: Vec<String>) -> Self {
        self.exclude_domains = domains;
        self
    }
}

/// One ranked document returned by the search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHit {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub images: Vec<ImageHit>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("search API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("search request failed: {0}")]
    Transport(String),

    #[error("search timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("malformed search response: {0}")]
    InvalidResponse(String),

    #[error("search is not configured: {0}")]
    Configuration(String),
}

/// Web search collaborator
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, options: &SearchOptions)
        -> Result<SearchResponse, SearchError>;

    /// Whether this provider can serve steps of `kind`
    fn supports(&self, kind: StepKind) -> bool {
        kind == StepKind::Web
    }

    fn name(&self) -> &str;
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchDepth::Basic => f.write_str("basic"),
            SearchDepth::Advanced => f.write_str("advanced"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WebOnly;

    #[async_trait]
    impl WebSearch for WebOnly {
        async fn search(
            &self,
            _query: &str,
            _options: &SearchOptions,
        ) -> Result<SearchResponse, SearchError> {
            Ok(SearchResponse::default())
        }

        fn name(&self) -> &str {
            "web-only"
        }
    }

    #[test]
    fn test_default_support_is_web_only() {
        let search = WebOnly;
        assert!(search.supports(StepKind::Web));
        assert!(!search.supports(StepKind::Academic));
        assert!(!search.supports(StepKind::Analysis));
    }

    #[test]
    fn test_depth_conversion() {
        assert_eq!(SearchDepth::from(Depth::Advanced), SearchDepth::Advanced);
        assert_eq!(SearchDepth::Basic.to_string(), "basic");
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"results":[{"title":"t","url":"u","content":"c"}]}"#).unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(response.images.is_empty());
        assert!(response.answer.is_none());
    }
}
