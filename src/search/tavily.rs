//! Tavily web search client

use super::client::{
    ImageHit, SearchDepth, SearchError, SearchHit, SearchOptions, SearchResponse, Topic, WebSearch,
};
use crate::config::DelveConfig;
use crate::research::StepKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    search_depth: SearchDepth,
    topic: Topic,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
    max_results: usize,
    include_answer: bool,
    include_images: bool,
    include_image_descriptions: bool,
    #[serde(skip_serializing_if = "is_empty")]
    include_domains: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    exclude_domains: &'a [String],
}

impl<'a> TavilySearchRequest<'a> {
    fn new(query: &'a str, options: &'a SearchOptions) -> Self {
        Self {
            query,
            search_depth: options.depth,
            topic: options.topic,
            days: options.days,
            max_results: options.max_results,
            include_answer: options.include_answer,
            include_images: options.include_images,
            include_image_descriptions: options.include_image_descriptions,
            include_domains: &options.include_domains,
            exclude_domains: &options.exclude_domains,
        }
    }
}

fn is_empty(domains: &&[String]) -> bool {
    domains.is_empty()
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    images: Vec<TavilyImage>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    raw_content: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

/// Images come back as bare URLs unless descriptions were requested
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TavilyImage {
    Url(String),
    Described {
        url: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl From<TavilyImage> for ImageHit {
    fn from(image: TavilyImage) -> Self {
        match image {
            TavilyImage::Url(url) => ImageHit {
                url,
                description: None,
            },
            TavilyImage::Described { url, description } => ImageHit { url, description },
        }
    }
}

impl From<TavilySearchResponse> for SearchResponse {
    fn from(response: TavilySearchResponse) -> Self {
        SearchResponse {
            answer: response.answer,
            results: response
                .results
                .into_iter()
                .map(|r| SearchHit {
                    title: r.title,
                    url: r.url,
                    content: r.content,
                    raw_content: r.raw_content,
                    published_date: r.published_date,
                    score: r.score,
                })
                .collect(),
            images: response.images.into_iter().map(ImageHit::from).collect(),
        }
    }
}

pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::Configuration(
                "TAVILY_API_KEY is empty".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: TAVILY_SEARCH_URL.to_string(),
            timeout,
        })
    }

    /// Client for the configured API key and search timeout
    pub fn from_config(config: &DelveConfig) -> Result<Self, SearchError> {
        let api_key = config.tavily_api_key.clone().ok_or_else(|| {
            SearchError::Configuration("TAVILY_API_KEY is not set".to_string())
        })?;
        Self::new(api_key, config.search_timeout())
    }

    /// Points the client at another endpoint, e.g. a local stub
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        let body = TavilySearchRequest::new(query, options);

        debug!(query, max_results = options.max_results, depth = %options.depth, "Tavily search");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    SearchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Tavily returned {}: {}", status, message);
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TavilySearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(parsed.into())
    }

    fn supports(&self, kind: StepKind) -> bool {
        matches!(kind, StepKind::Web | StepKind::Academic)
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

impl std::fmt::Debug for TavilySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilySearch")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}
