//! Shared fixtures for pipeline integration tests

#![allow(dead_code)]

use delve::llm::{MockGeneration, MockTextGeneration};
use delve::pipeline::{PipelineConfig, ResearchOutcome, ResearchPipeline};
use delve::progress::ProgressEvent;
use delve::research::ResearchError;
use delve::search::MockWebSearch;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_stream::StreamExt;

pub fn plan(queries: &[(&str, &str, u8)], analyses: &[&str]) -> Value {
    json!({
        "searchQueries": queries
            .iter()
            .map(|(query, source, priority)| json!({
                "query": query,
                "rationale": format!("covers {}", query),
                "source": source,
                "priority": priority
            }))
            .collect::<Vec<_>>(),
        "requiredAnalyses": analyses
            .iter()
            .map(|kind| json!({
                "type": kind,
                "description": format!("{} of the results", kind),
                "importance": 3
            }))
            .collect::<Vec<_>>()
    })
}

pub fn analysis(insight: &str, confidence: f64) -> Value {
    json!({
        "findings": [{"insight": insight, "evidence": ["https://example.com"], "confidence": confidence}],
        "implications": ["follow up"],
        "limitations": []
    })
}

pub fn gaps(queries: &[&str]) -> Value {
    json!({
        "limitations": [{
            "type": "coverage",
            "description": "few primary sources",
            "severity": 3,
            "potentialSolutions": ["search vendor docs"]
        }],
        "knowledgeGaps": [{
            "topic": "benchmarks",
            "reason": "no recent numbers",
            "additionalQueries": queries
        }],
        "recommendedFollowup": [{"action": "benchmark", "rationale": "numbers", "priority": 4}]
    })
}

pub fn synthesis() -> Value {
    json!({
        "keyFindings": [
            {"finding": "adoption is growing", "confidence": 0.8, "supportingEvidence": ["a"]},
            {"finding": "tooling lags", "confidence": 0.6, "supportingEvidence": ["b"]}
        ],
        "remainingUncertainties": ["long term cost"]
    })
}

pub fn generator(answers: Vec<Value>) -> Arc<MockTextGeneration> {
    let client = Arc::new(MockTextGeneration::new());
    client.add_responses(answers.into_iter().map(MockGeneration::json));
    client
}

pub fn search_with(urls_by_query: &[(&str, &[&str])]) -> Arc<MockWebSearch> {
    let search = MockWebSearch::new();
    for (query, urls) in urls_by_query {
        search.respond_to(query, Ok(MockWebSearch::response_with_urls(urls)));
    }
    Arc::new(search)
}

pub fn no_report() -> PipelineConfig {
    PipelineConfig::new().with_report(false)
}

/// Runs to completion and returns the outcome with every event emitted
pub async fn run_collecting(
    pipeline: &ResearchPipeline,
    topic: &str,
) -> (Result<ResearchOutcome, ResearchError>, Vec<ProgressEvent>) {
    let mut run = pipeline.spawn(topic);
    let events = run.take_events().expect("event stream");
    let collector = tokio::spawn(events.collect::<Vec<_>>());
    let result = run.wait(None).await;
    let events = collector.await.expect("collector");
    (result, events)
}

pub fn ids(events: &[ProgressEvent]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

pub fn assert_steps_bounded(events: &[ProgressEvent]) {
    for event in events {
        if let (Some(completed), Some(total)) = (event.completed_steps, event.total_steps) {
            assert!(
                completed <= total,
                "{} reported {}/{} steps",
                event.id,
                completed,
                total
            );
        }
    }
}
