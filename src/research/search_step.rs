//! Execution of a single search step

use super::error::ResearchError;
use super::types::{Depth, SearchQuerySpec, SearchResult, SearchStep, SearchStepOutput, StepKind};
use crate::search::{SearchError, SearchOptions, WebSearch};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Result cap for second-pass gap searches
pub const GAP_SEARCH_MAX_RESULTS: usize = 5;

/// Higher priority (lower number) earns more results: 1 → 5, 5 → 1
pub fn max_results_for_priority(priority: u8) -> usize {
    usize::from(6u8.saturating_sub(priority).clamp(1, 10))
}

pub struct SearchExecutor {
    search: Arc<dyn WebSearch>,
    depth: Depth,
    include_domains: Vec<String>,
    exclude_domains: Vec<String>,
    timeout: Option<Duration>,
}

impl SearchExecutor {
    pub fn new(search: Arc<dyn WebSearch>, depth: Depth) -> Self {
        Self {
            search,
            depth,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_include_domains(mut self, domains: Vec<String>) -> Self {
        self.include_domains = domains;
        self
    }

    pub fn with_exclude_domains(mut self, domains: Vec<String>) -> Self {
        self.exclude_domains = domains;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn options(&self, max_results: usize) -> SearchOptions {
        SearchOptions::default()
            .with_depth(self.depth.into())
            .with_max_results(max_results)
            .with_include_domains(self.include_domains.clone())
            .with_exclude_domains(self.exclude_domains.clone())
    }

    /// Runs a plan step. A kind the backend does not serve completes with
    /// no results; backend failures and timeouts come back as
    /// [`ResearchError::SearchStep`].
    pub async fn execute(&self, step: &SearchStep) -> Result<SearchStepOutput, ResearchError> {
        let max_results = max_results_for_priority(step.query.priority);
        self.run(&step.id, step.kind, &step.query, max_results).await
    }

    /// Runs a second-pass query as a web search
    pub async fn execute_gap(
        &self,
        id: &str,
        query: &SearchQuerySpec,
    ) -> Result<SearchStepOutput, ResearchError> {
        self.run(id, StepKind::Web, query, GAP_SEARCH_MAX_RESULTS)
            .await
    }

    async fn run(
        &self,
        id: &str,
        kind: StepKind,
        query: &SearchQuerySpec,
        max_results: usize,
    ) -> Result<SearchStepOutput, ResearchError> {
        let mut output = SearchStepOutput::empty(id, kind, query);

        if !self.search.supports(kind) {
            debug!(
                step = id,
                kind = %kind,
                backend = self.search.name(),
                "Search backend does not serve this kind; completing with no results"
            );
            return Ok(output);
        }

        let response = self
            .search_with_timeout(&query.query, max_results)
            .await
            .map_err(|source| ResearchError::SearchStep {
                step_id: id.to_string(),
                source,
            })?;

        output.results = response
            .results
            .into_iter()
            .map(|hit| SearchResult {
                source: kind,
                title: hit.title,
                url: hit.url,
                content: hit.content,
                published_date: hit.published_date,
            })
            .collect();
        debug!(step = id, results = output.results.len(), "Search step finished");
        Ok(output)
    }

    async fn search_with_timeout(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<crate::search::SearchResponse, SearchError> {
        let options = self.options(max_results);
        let call = self.search.search(query, &options);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| SearchError::Timeout {
                    seconds: limit.as_secs(),
                })?,
            None => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::SourceKind;
    use crate::search::{MockWebSearch, SearchDepth};

    fn step(id: &str, kind: StepKind, priority: u8) -> SearchStep {
        SearchStep {
            id: id.to_string(),
            kind,
            query: SearchQuerySpec {
                query: "rust tokio".to_string(),
                rationale: "r".to_string(),
                source: SourceKind::Both,
                priority,
            },
        }
    }

    #[test]
    fn test_max_results_for_priority() {
        assert_eq!(max_results_for_priority(1), 5);
        assert_eq!(max_results_for_priority(3), 3);
        assert_eq!(max_results_for_priority(5), 1);
        assert_eq!(max_results_for_priority(9), 1);
        assert_eq!(max_results_for_priority(0), 6);
        assert_eq!(max_results_for_priority(u8::MAX), 1);
    }

    #[tokio::test]
    async fn test_execute_maps_hits_and_options() {
        let search = Arc::new(MockWebSearch::new());
        search.add_response(MockWebSearch::response_with_urls(&[
            "https://a.com/x",
            "https://a.com/y",
        ]));

        let executor = SearchExecutor::new(search.clone(), Depth::Advanced)
            .with_include_domains(vec!["a.com".to_string()]);
        let output = executor
            .execute(&step("search-web-0", StepKind::Web, 2))
            .await
            .unwrap();

        assert_eq!(output.step_id, "search-web-0");
        assert_eq!(output.results.len(), 2);
        assert_eq!(output.results[0].source, StepKind::Web);
        assert!(output.error.is_none());

        let (query, options) = &search.calls()[0];
        assert_eq!(query, "rust tokio");
        assert_eq!(options.max_results, 4);
        assert_eq!(options.depth, SearchDepth::Advanced);
        assert_eq!(options.include_domains, vec!["a.com".to_string()]);
    }

    #[tokio::test]
    async fn test_backend_failure_is_returned_to_caller() {
        let search = Arc::new(MockWebSearch::new());
        search.add_error(SearchError::Api {
            status: 500,
            message: "boom".to_string(),
        });

        let executor = SearchExecutor::new(search, Depth::Basic);
        let err = executor
            .execute(&step("search-web-1", StepKind::Web, 3))
            .await
            .unwrap_err();

        match &err {
            ResearchError::SearchStep { step_id, source } => {
                assert_eq!(step_id, "search-web-1");
                assert!(matches!(source, SearchError::Api { status: 500, .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_unsupported_kind_is_noop() {
        let search = Arc::new(MockWebSearch::new());
        let executor = SearchExecutor::new(search.clone(), Depth::Basic);

        let output = executor
            .execute(&step("search-academic-0", StepKind::Academic, 3))
            .await
            .unwrap();

        assert!(output.results.is_empty());
        assert!(output.error.is_none());
        assert_eq!(search.call_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_search_timeout() {
        let search = Arc::new(MockWebSearch::new().with_delay(Duration::from_millis(200)));
        let executor = SearchExecutor::new(search, Depth::Basic)
            .with_timeout(Duration::from_millis(10));

        let err = executor
            .execute(&step("search-web-0", StepKind::Web, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResearchError::SearchStep {
                source: SearchError::Timeout { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_gap_search_uses_fixed_cap() {
        let search = Arc::new(MockWebSearch::new());
        let executor = SearchExecutor::new(search.clone(), Depth::Advanced);
        let query = step("x", StepKind::Web, 3).query;

        let output = executor.execute_gap("gap-search-0", &query).await.unwrap();
        assert_eq!(output.step_id, "gap-search-0");
        assert_eq!(output.kind, StepKind::Web);
        assert_eq!(search.calls()[0].1.max_results, GAP_SEARCH_MAX_RESULTS);
    }

    #[tokio::test]
    async fn test_gap_search_failure_names_gap_step() {
        let search = Arc::new(MockWebSearch::new());
        search.add_error(SearchError::Timeout { seconds: 30 });
        let executor = SearchExecutor::new(search, Depth::Advanced);
        let query = step("x", StepKind::Web, 3).query;

        let err = executor.execute_gap("gap-search-1", &query).await.unwrap_err();
        assert!(matches!(
            err,
            ResearchError::SearchStep { ref step_id, .. } if step_id == "gap-search-1"
        ));
    }
}
