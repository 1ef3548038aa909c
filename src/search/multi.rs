//! Concurrent multi-query web search
//!
//! Every query runs in its own branch; branches only write their own result
//! slot and are joined at the end, so output order matches input order.

use super::client::{ImageHit, SearchDepth, SearchHit, SearchOptions, Topic, WebSearch};
use super::dedup::deduplicate_by_domain_and_url;
use super::images::{sanitize_url, ImageProbe};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

const DEFAULT_MAX_RESULTS: usize = 10;
const NEWS_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchRequest {
    pub queries: Vec<String>,
    /// Per query; missing entries fall back to the first one, then 10
    #[serde(default)]
    pub max_results: Vec<usize>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub search_depth: Vec<SearchDepth>,
    #[serde(default)]
    pub exclude_domains: Vec<String>,
    #[serde(default = "default_true")]
    pub include_image_descriptions: bool,
}

fn default_true() -> bool {
    true
}

impl MultiSearchRequest {
    pub fn new(queries: Vec<String>) -> Self {
        Self {
            queries,
            include_image_descriptions: true,
            ..Default::default()
        }
    }

    fn max_results_for(&self, index: usize) -> usize {
        pick(&self.max_results, index)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_RESULTS)
    }

    fn topic_for(&self, index: usize) -> Topic {
        pick(&self.topics, index).unwrap_or_default()
    }

    fn depth_for(&self, index: usize) -> SearchDepth {
        pick(&self.search_depth, index).unwrap_or_default()
    }

    fn options_for(&self, index: usize) -> SearchOptions {
        let topic = self.topic_for(index);
        SearchOptions {
            depth: self.depth_for(index),
            max_results: self.max_results_for(index),
            topic,
            days: (topic == Topic::News).then_some(NEWS_WINDOW_DAYS),
            include_domains: Vec::new(),
            exclude_domains: self.exclude_domains.clone(),
            include_answer: true,
            include_images: true,
            include_image_descriptions: self.include_image_descriptions,
        }
    }
}

fn pick<T: Copy>(values: &[T], index: usize) -> Option<T> {
    values.get(index).or_else(|| values.first()).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Completed,
    Failed,
}

/// Sent once per query as soon as its search returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCompletion {
    pub query: String,
    pub index: usize,
    pub total: usize,
    pub status: QueryStatus,
    pub results_count: usize,
    pub images_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySearchResult {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub images: Vec<ImageHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct MultiSearch {
    search: Arc<dyn WebSearch>,
    probe: Arc<dyn ImageProbe>,
}

impl MultiSearch {
    pub fn new(search: Arc<dyn WebSearch>, probe: Arc<dyn ImageProbe>) -> Self {
        Self { search, probe }
    }

    /// Runs all queries concurrently. A failing query yields an empty slot
    /// with `error` set; the others are unaffected.
    pub async fn run(
        &self,
        request: &MultiSearchRequest,
        notices: Option<&UnboundedSender<QueryCompletion>>,
    ) -> Vec<QuerySearchResult> {
        let total = request.queries.len();
        debug!(total, "Starting multi-query search");

        let branches = request
            .queries
            .iter()
            .enumerate()
            .map(|(index, query)| self.run_one(request, index, query, total, notices));

        join_all(branches).await
    }

    async fn run_one(
        &self,
        request: &MultiSearchRequest,
        index: usize,
        query: &str,
        total: usize,
        notices: Option<&UnboundedSender<QueryCompletion>>,
    ) -> QuerySearchResult {
        let options = request.options_for(index);
        let keep_dates = options.topic == Topic::News;

        let response = match self.search.search(query, &options).await {
            Ok(response) => response,
            Err(e) => {
                warn!(query, error = %e, "Search query failed");
                notify(
                    notices,
                    QueryCompletion {
                        query: query.to_string(),
                        index,
                        total,
                        status: QueryStatus::Failed,
                        results_count: 0,
                        images_count: 0,
                    },
                );
                return QuerySearchResult {
                    query: query.to_string(),
                    results: Vec::new(),
                    images: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        notify(
            notices,
            QueryCompletion {
                query: query.to_string(),
                index,
                total,
                status: QueryStatus::Completed,
                results_count: response.results.len(),
                images_count: response.images.len(),
            },
        );

        let results = deduplicate_by_domain_and_url(response.results)
            .into_iter()
            .map(|hit| SearchHit {
                published_date: if keep_dates { hit.published_date } else { None },
                ..hit
            })
            .collect();

        let images = self
            .validate_images(response.images, request.include_image_descriptions)
            .await;

        QuerySearchResult {
            query: query.to_string(),
            results,
            images,
            error: None,
        }
    }

    async fn validate_images(&self, images: Vec<ImageHit>, need_description: bool) -> Vec<ImageHit> {
        let probes = deduplicate_by_domain_and_url(images).into_iter().map(|image| {
            let probe = Arc::clone(&self.probe);
            async move {
                let url = sanitize_url(&image.url);
                if !probe.is_valid_image(&url).await {
                    return None;
                }
                if need_description {
                    let description = image.description.filter(|d| !d.is_empty())?;
                    Some(ImageHit {
                        url,
                        description: Some(description),
                    })
                } else {
                    Some(ImageHit {
                        url,
                        description: None,
                    })
                }
            }
        });

        join_all(probes).await.into_iter().flatten().collect()
    }
}

fn notify(notices: Option<&UnboundedSender<QueryCompletion>>, notice: QueryCompletion) {
    if let Some(tx) = notices {
        if tx.send(notice).is_err() {
            debug!("Query completion receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{MockWebSearch, SearchError, SearchResponse};
    use async_trait::async_trait;
    use std::time::{Duration, Instant};

    struct AcceptAll;

    #[async_trait]
    impl ImageProbe for AcceptAll {
        async fn is_valid_image(&self, url: &str) -> bool {
            !url.contains("broken")
        }
    }

    #[test]
    fn test_per_query_fallbacks() {
        let mut request = MultiSearchRequest::new(vec!["a".into(), "b".into(), "c".into()]);
        request.max_results = vec![4];
        request.topics = vec![Topic::General, Topic::News];

        assert_eq!(request.max_results_for(2), 4);
        assert_eq!(request.topic_for(1), Topic::News);
        assert_eq!(request.topic_for(2), Topic::General);
        assert_eq!(request.depth_for(0), SearchDepth::Basic);

        let news = request.options_for(1);
        assert_eq!(news.days, Some(7));
        assert!(request.options_for(0).days.is_none());
    }

    #[test]
    fn test_zero_max_results_uses_default() {
        let mut request = MultiSearchRequest::new(vec!["a".into()]);
        request.max_results = vec![0];
        assert_eq!(request.max_results_for(0), DEFAULT_MAX_RESULTS);
    }

    #[tokio::test]
    async fn test_results_keep_input_order_and_dedupe() {
        let search = Arc::new(MockWebSearch::new());
        search.respond_to(
            "first",
            Ok(MockWebSearch::response_with_urls(&[
                "https://a.com/1",
                "https://a.com/2",
                "https://b.com/1",
            ])),
        );
        search.respond_to(
            "second",
            Ok(MockWebSearch::response_with_urls(&["https://c.com/1"])),
        );

        let multi = MultiSearch::new(search, Arc::new(AcceptAll));
        let request = MultiSearchRequest::new(vec!["first".into(), "second".into()]);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let results = multi.run(&request, Some(&tx)).await;
        drop(tx);

        assert_eq!(results[0].query, "first");
        assert_eq!(results[0].results.len(), 2);
        assert_eq!(results[1].results.len(), 1);

        let mut notices = Vec::new();
        while let Some(n) = rx.recv().await {
            notices.push(n);
        }
        assert_eq!(notices.len(), 2);
        let first = notices.iter().find(|n| n.index == 0).unwrap();
        assert_eq!(first.results_count, 3);
        assert_eq!(first.total, 2);
        assert_eq!(first.status, QueryStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_query_does_not_sink_others() {
        let search = Arc::new(MockWebSearch::new());
        search.respond_to("bad", Err(SearchError::Timeout { seconds: 30 }));
        search.respond_to(
            "good",
            Ok(MockWebSearch::response_with_urls(&["https://ok.com"])),
        );

        let multi = MultiSearch::new(search, Arc::new(AcceptAll));
        let results = multi
            .run(&MultiSearchRequest::new(vec!["bad".into(), "good".into()]), None)
            .await;

        assert!(results[0].error.is_some());
        assert!(results[0].results.is_empty());
        assert_eq!(results[1].results.len(), 1);
    }

    #[tokio::test]
    async fn test_queries_run_concurrently() {
        let search = Arc::new(MockWebSearch::new().with_delay(Duration::from_millis(200)));
        let multi = MultiSearch::new(search.clone(), Arc::new(AcceptAll));
        let request = MultiSearchRequest::new(vec!["a".into(), "b".into(), "c".into()]);

        let started = Instant::now();
        let results = multi.run(&request, None).await;
        let elapsed = started.elapsed();

        assert_eq!(results.len(), 3);
        assert_eq!(search.call_count(), 3);
        assert!(
            elapsed < Duration::from_millis(450),
            "three 200ms searches took {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_image_filtering() {
        let search = Arc::new(MockWebSearch::new());
        search.respond_to(
            "pics",
            Ok(SearchResponse {
                answer: None,
                results: vec![],
                images: vec![
                    ImageHit {
                        url: "https://img.com/a b.png".to_string(),
                        description: Some("diagram".to_string()),
                    },
                    ImageHit {
                        url: "https://other.com/x.png".to_string(),
                        description: Some(String::new()),
                    },
                    ImageHit {
                        url: "https://broken.com/y.png".to_string(),
                        description: Some("chart".to_string()),
                    },
                ],
            }),
        );

        let multi = MultiSearch::new(search, Arc::new(AcceptAll));
        let results = multi
            .run(&MultiSearchRequest::new(vec!["pics".into()]), None)
            .await;

        let images = &results[0].images;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://img.com/a%20b.png");
        assert_eq!(images[0].description.as_deref(), Some("diagram"));
    }

    #[tokio::test]
    async fn test_published_date_only_for_news() {
        let mut response = MockWebSearch::response_with_urls(&["https://n.com/1"]);
        response.results[0].published_date = Some("2024-05-01".to_string());

        let search = Arc::new(MockWebSearch::new());
        search.respond_to("general", Ok(response.clone()));
        search.respond_to("news", Ok(response));

        let multi = MultiSearch::new(search, Arc::new(AcceptAll));
        let mut request = MultiSearchRequest::new(vec!["general".into(), "news".into()]);
        request.topics = vec![Topic::General, Topic::News];
        let results = multi.run(&request, None).await;

        assert!(results[0].results[0].published_date.is_none());
        assert_eq!(
            results[1].results[0].published_date.as_deref(),
            Some("2024-05-01")
        );
    }
}
