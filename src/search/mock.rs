use super::client::{SearchError, SearchHit, SearchOptions, SearchResponse, WebSearch};
use crate::research::StepKind;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted web search.
///
/// Responses registered for a specific query win; otherwise the shared
/// FIFO queue is used, and an empty response when that is exhausted.
pub struct MockWebSearch {
    by_query: Mutex<HashMap<String, VecDeque<Result<SearchResponse, SearchError>>>>,
    queue: Mutex<VecDeque<Result<SearchResponse, SearchError>>>,
    calls: Mutex<Vec<(String, SearchOptions)>>,
    supported: Vec<StepKind>,
    delay: Option<Duration>,
}

impl MockWebSearch {
    pub fn new() -> Self {
        Self {
            by_query: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            supported: vec![StepKind::Web],
            delay: None,
        }
    }

    /// Builder: step kinds this mock claims to serve
    pub fn supporting(mut self, kinds: &[StepKind]) -> Self {
        self.supported = kinds.to_vec();
        self
    }

    /// Builder: sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn add_response(&self, response: SearchResponse) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(response));
    }

    pub fn add_error(&self, error: SearchError) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    pub fn respond_to(&self, query: &str, response: Result<SearchResponse, SearchError>) {
        self.by_query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(query.to_string())
            .or_default()
            .push_back(response);
    }

    /// Every `(query, options)` pair received so far, in order
    pub fn calls(&self) -> Vec<(String, SearchOptions)> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Convenience response with one hit per URL
    pub fn response_with_urls(urls: &[&str]) -> SearchResponse {
        SearchResponse {
            answer: None,
            results: urls
                .iter()
                .enumerate()
                .map(|(i, url)| SearchHit {
                    title: format!("Result {}", i + 1),
                    url: url.to_string(),
                    content: format!("Content of {}", url),
                    raw_content: None,
                    published_date: None,
                    score: None,
                })
                .collect(),
            images: Vec::new(),
        }
    }
}

impl Default for MockWebSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearch for MockWebSearch {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((query.to_string(), options.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .by_query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(query)
            .and_then(|responses| responses.pop_front());
        if let Some(response) = scripted {
            return response;
        }

        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(SearchResponse::default()))
    }

    fn supports(&self, kind: StepKind) -> bool {
        self.supported.contains(&kind)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl std::fmt::Debug for MockWebSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockWebSearch")
            .field("supported", &self.supported)
            .field("calls", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_specific_response_wins() {
        let search = MockWebSearch::new();
        search.add_response(MockWebSearch::response_with_urls(&["https://queue.com"]));
        search.respond_to(
            "special",
            Ok(MockWebSearch::response_with_urls(&["https://special.com"])),
        );

        let special = search
            .search("special", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(special.results[0].url, "https://special.com");

        let other = search.search("other", &SearchOptions::default()).await.unwrap();
        assert_eq!(other.results[0].url, "https://queue.com");
        assert_eq!(search.call_count(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_queue_returns_empty() {
        let search = MockWebSearch::new();
        let response = search.search("q", &SearchOptions::default()).await.unwrap();
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let search = MockWebSearch::new();
        search.add_error(SearchError::Timeout { seconds: 30 });
        assert!(search.search("q", &SearchOptions::default()).await.is_err());
    }

    #[test]
    fn test_supporting() {
        let search = MockWebSearch::new().supporting(&[StepKind::Web, StepKind::Academic]);
        assert!(search.supports(StepKind::Academic));
        assert!(!MockWebSearch::new().supports(StepKind::Academic));
    }
}
