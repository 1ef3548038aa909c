//! End-to-end research runs against scripted generation and search

mod support;

use delve::llm::MockStream;
use delve::pipeline::{PipelineConfig, ResearchPipeline};
use delve::progress::{EventKind, EventStatus, ProgressEvent};
use delve::research::{Depth, ResearchProfile, SourceKind};
use delve::search::SearchDepth;
use std::sync::Arc;
use support::*;

fn card<'a>(events: &'a [ProgressEvent], id: &str, status: EventStatus) -> &'a ProgressEvent {
    events
        .iter()
        .find(|e| e.id == id && e.status == status)
        .unwrap_or_else(|| panic!("no {:?} card for {}", status, id))
}

#[tokio::test]
async fn test_basic_run_event_sequence() {
    let generator = generator(vec![
        plan(&[("rust async", "web", 3), ("tokio vs smol", "web", 4)], &["comparison"]),
        analysis("tokio dominates", 0.8),
    ]);
    let search = search_with(&[
        ("rust async", &["https://tokio.rs/blog", "https://rust-lang.org/async"]),
        ("tokio vs smol", &["https://github.com/smol-rs/smol"]),
    ]);

    let pipeline = ResearchPipeline::new(generator.clone(), search.clone(), no_report());
    let (result, events) = run_collecting(&pipeline, "async rust").await;
    let outcome = result.unwrap();

    assert_eq!(
        ids(&events),
        vec![
            "research-plan-initial",
            "research-plan",
            "research-progress",
            "search-web-0",
            "search-web-0",
            "search-web-1",
            "search-web-1",
            "research-progress",
            "analysis-0",
            "analysis-0",
            "research-progress",
            "research-progress",
        ]
    );

    let plan_card = card(&events, "research-plan", EventStatus::Completed);
    assert_eq!(plan_card.total_steps, Some(3));
    assert!(plan_card.payload.plan.is_some());

    let first = card(&events, "search-web-0", EventStatus::Completed);
    assert_eq!(first.kind, EventKind::Web);
    assert_eq!(first.title, "Searched the web for \"rust async\"");
    assert_eq!(first.payload.results.as_ref().map(Vec::len), Some(2));
    assert!(first.overwrite);

    let analysis_card = card(&events, "analysis-0", EventStatus::Completed);
    assert_eq!(analysis_card.payload.analysis_type.as_deref(), Some("comparison"));
    assert_eq!(analysis_card.payload.findings.as_ref().map(Vec::len), Some(1));

    let last = events.last().unwrap();
    assert_eq!(last.kind, EventKind::Progress);
    assert_eq!(last.is_complete, Some(true));
    assert_eq!(last.completed_steps, Some(3));
    assert_eq!(last.total_steps, Some(3));
    assert_steps_bounded(&events);

    assert_eq!(outcome.completed_steps, 3);
    assert_eq!(outcome.total_steps, 3);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.sources().len(), 3);
    assert!(outcome.gap_analysis.is_none());
    assert!(outcome.synthesis.is_none());

    // maxResults follows priority: 6 - 3 and 6 - 4
    let calls = search.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1.max_results, 3);
    assert_eq!(calls[1].1.max_results, 2);
    assert_eq!(calls[0].1.depth, SearchDepth::Basic);

    // Analysis sees the merged results of both searches
    let requests = generator.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].prompt.contains("https://github.com/smol-rs/smol"));
    assert_eq!(requests[0].temperature, Some(0.5));
}

#[tokio::test]
async fn test_advanced_run_adds_gap_pass() {
    let generator = generator(vec![
        plan(&[("http3 adoption", "web", 3), ("quic deployment", "web", 4)], &["trend"]),
        analysis("adoption rising", 0.7),
        gaps(&["http3 benchmarks 2024", "quic cpu cost"]),
        synthesis(),
    ]);
    let search = search_with(&[
        ("http3 adoption", &["https://a.example/one"]),
        ("quic deployment", &["https://d.example/four"]),
        ("http3 benchmarks 2024", &["https://b.example/two"]),
        ("quic cpu cost", &["https://c.example/three"]),
    ]);

    let pipeline = ResearchPipeline::new(
        generator.clone(),
        search.clone(),
        no_report().with_depth(Depth::Advanced),
    );
    let (result, events) = run_collecting(&pipeline, "HTTP/3").await;
    let outcome = result.unwrap();

    let plan_card = card(&events, "research-plan", EventStatus::Completed);
    assert_eq!(plan_card.total_steps, Some(3));

    let gap_searches: Vec<&ProgressEvent> = events
        .iter()
        .filter(|e| e.id.starts_with("gap-search-") && e.status == EventStatus::Completed)
        .collect();
    assert_eq!(gap_searches.len(), 2);
    assert_eq!(gap_searches[0].id, "gap-search-0");
    assert_eq!(
        gap_searches[1].title,
        "Additional web search for \"quic cpu cost\""
    );

    let gap_card = card(&events, "gap-analysis", EventStatus::Completed);
    assert_eq!(gap_card.total_steps, Some(4));
    assert_eq!(gap_card.payload.gaps.as_ref().map(Vec::len), Some(1));
    assert_eq!(gap_card.payload.recommendations.as_ref().map(Vec::len), Some(1));
    let limitation = &gap_card.payload.findings.as_ref().unwrap()[0];
    assert!((limitation.confidence - 0.6).abs() < 1e-9);

    let synthesis_cards: Vec<&ProgressEvent> = events
        .iter()
        .filter(|e| e.id == "final-synthesis")
        .collect();
    assert_eq!(synthesis_cards.len(), 2);
    assert_eq!(synthesis_cards[1].message, "Synthesized 2 key findings");
    assert_eq!(
        synthesis_cards[1].payload.uncertainties,
        Some(vec!["long term cost".to_string()])
    );

    // Two searches and one analysis, then gap analysis and synthesis
    let last = events.last().unwrap();
    assert_eq!(last.total_steps, Some(5));
    assert_eq!(last.completed_steps, Some(5));
    assert_steps_bounded(&events);
    assert_eq!(outcome.total_steps, 5);
    assert_eq!(outcome.completed_steps, 5);

    assert_eq!(outcome.results.len(), 4);
    assert_eq!(outcome.additional_queries.len(), 2);
    assert_eq!(outcome.additional_queries[0].source, SourceKind::All);
    assert_eq!(outcome.additional_queries[1].source, SourceKind::Web);
    assert_eq!(outcome.synthesis.as_ref().unwrap().key_findings.len(), 2);

    let calls = search.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].1.depth, SearchDepth::Advanced);
    assert_eq!(calls[0].1.max_results, 3);
    assert_eq!(calls[1].1.max_results, 2);
    assert_eq!(calls[2].1.max_results, 5);
    assert_eq!(calls[3].1.max_results, 5);

    let requests = generator.requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[2].temperature, Some(0.0));
    assert_eq!(requests[3].temperature, Some(0.0));
    assert!(requests[3].prompt.contains("https://c.example/three"));
}

#[tokio::test]
async fn test_second_pass_on_known_domain_reaches_synthesis() {
    let generator = generator(vec![
        plan(&[("lcp", "web", 3), ("inp", "web", 3)], &["overview"]),
        analysis("lcp dominates field data", 0.7),
        gaps(&["fetch priority", "optimize lcp"]),
        synthesis(),
    ]);
    let search = search_with(&[
        ("lcp", &["https://web.dev/articles/lcp"]),
        ("inp", &["https://web.dev/articles/inp"]),
        ("fetch priority", &["https://web.dev/articles/fetch-priority"]),
        ("optimize lcp", &["https://web.dev/articles/optimize-lcp"]),
    ]);

    let pipeline = ResearchPipeline::new(
        generator.clone(),
        search,
        no_report().with_depth(Depth::Advanced),
    );
    let (result, _) = run_collecting(&pipeline, "Core Web Vitals").await;
    let outcome = result.unwrap();
    assert_eq!(outcome.results.len(), 4);

    let requests = generator.requests();
    assert_eq!(requests.len(), 4);

    // Analysis reads one document per domain
    assert!(requests[1].prompt.contains("https://web.dev/articles/lcp"));
    assert!(!requests[1].prompt.contains("https://web.dev/articles/inp"));

    // Gap analysis and synthesis read every document
    assert!(requests[2].prompt.contains("https://web.dev/articles/lcp"));
    assert!(requests[2].prompt.contains("https://web.dev/articles/inp"));
    let synthesis_prompt = &requests[3].prompt;
    for url in [
        "https://web.dev/articles/lcp",
        "https://web.dev/articles/inp",
        "https://web.dev/articles/fetch-priority",
        "https://web.dev/articles/optimize-lcp",
    ] {
        assert!(synthesis_prompt.contains(url), "synthesis input lacks {}", url);
    }
}

#[tokio::test]
async fn test_advanced_run_without_gaps_skips_second_pass() {
    let generator = generator(vec![
        plan(&[("wasm gc", "web", 3)], &[]),
        serde_json::json!({"limitations": [], "knowledgeGaps": [], "recommendedFollowup": []}),
    ]);
    let pipeline = ResearchPipeline::new(
        generator.clone(),
        search_with(&[("wasm gc", &["https://v8.dev/gc"])]),
        no_report().with_depth(Depth::Advanced),
    );
    let (result, events) = run_collecting(&pipeline, "wasm gc").await;
    let outcome = result.unwrap();

    assert!(!events.iter().any(|e| e.id == "final-synthesis"));
    assert!(!events.iter().any(|e| e.id.starts_with("gap-search-")));
    assert_eq!(outcome.total_steps, 2);
    assert_eq!(outcome.completed_steps, 2);
    assert!(outcome.synthesis.is_none());
    assert_eq!(generator.remaining_responses(), 0);
}

#[tokio::test]
async fn test_both_source_runs_web_and_academic() {
    let generator = generator(vec![plan(&[("crdt merge", "both", 2)], &[])]);
    let pipeline = ResearchPipeline::new(generator, search_with(&[]), no_report());
    let (result, events) = run_collecting(&pipeline, "crdts").await;
    let outcome = result.unwrap();

    let academic = card(&events, "search-academic-0", EventStatus::Running);
    assert_eq!(academic.kind, EventKind::Academic);
    assert_eq!(outcome.total_steps, 2);
    // The mock serves only web searches; academic steps finish empty without error
    assert!(outcome.results.iter().all(|r| r.error.is_none()));
}

#[tokio::test]
async fn test_report_is_streamed_into_outcome() {
    let generator = generator(vec![
        plan(&[("rust embedded", "web", 3)], &["overview"]),
        analysis("embassy is popular", 0.6),
    ]);
    generator.add_stream(MockStream::text("# Embedded Rust\n\nEmbassy leads."));

    let pipeline = ResearchPipeline::new(
        generator,
        search_with(&[("rust embedded", &["https://embassy.dev"])]),
        PipelineConfig::new(),
    );
    let (result, _) = run_collecting(&pipeline, "embedded rust").await;
    let report = result.unwrap().report.unwrap();
    assert!(report.starts_with("# Embedded Rust"));
    assert!(report.ends_with("Embassy leads."));
}

#[tokio::test]
async fn test_trace_profile_restricts_domains() {
    let generator = generator(vec![plan(&[("lcp regressions", "web", 3)], &[])]);
    let search = search_with(&[]);
    let pipeline = ResearchPipeline::new(
        generator,
        search.clone(),
        no_report().with_profile(ResearchProfile::Trace),
    );
    let (result, _) = run_collecting(&pipeline, "LCP").await;
    result.unwrap();

    let calls = search.calls();
    assert!(calls[0].1.include_domains.contains(&"web.dev".to_string()));
}

#[tokio::test]
async fn test_extra_handlers_see_every_event() {
    use delve::progress::ProgressHandler;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ProgressHandler for Recorder {
        fn on_progress(&self, event: &ProgressEvent) {
            self.0.lock().unwrap().push(event.id.clone());
        }
    }

    let recorder = Arc::new(Recorder::default());
    let generator = generator(vec![plan(&[("a", "web", 3)], &[])]);
    let pipeline = ResearchPipeline::new(generator, search_with(&[]), no_report())
        .with_handler(recorder.clone());
    let (result, events) = run_collecting(&pipeline, "a").await;
    result.unwrap();

    let seen = recorder.0.lock().unwrap().clone();
    assert_eq!(seen, ids(&events));
}
