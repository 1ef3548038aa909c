//! Wire shape of progress events as a consumer receives them

mod support;

use delve::pipeline::ResearchPipeline;
use delve::progress::ENVELOPE_TYPE;
use delve::research::Depth;
use serde_json::Value;
use support::*;

#[tokio::test]
async fn test_envelopes_are_camel_case() {
    let generator = generator(vec![
        plan(&[("quic", "web", 3)], &["overview"]),
        analysis("quic is deployed widely", 0.9),
        gaps(&["quic middleboxes"]),
        synthesis(),
    ]);
    let pipeline = ResearchPipeline::new(
        generator,
        search_with(&[("quic", &["https://quic.example"])]),
        no_report().with_depth(Depth::Advanced),
    );
    let (result, events) = run_collecting(&pipeline, "quic").await;
    result.unwrap();

    let envelopes: Vec<Value> = events
        .iter()
        .map(|e| serde_json::to_value(e.envelope()).unwrap())
        .collect();

    for envelope in &envelopes {
        assert_eq!(envelope["type"], ENVELOPE_TYPE);
        let data = &envelope["data"];
        assert!(data["id"].is_string());
        assert!(data["timestamp"].is_number());
        assert!(data["overwrite"].is_boolean());
        assert!(data.get("completed_steps").is_none());
    }

    let plan = envelopes
        .iter()
        .find(|e| e["data"]["id"] == "research-plan")
        .unwrap();
    assert_eq!(plan["data"]["type"], "plan");
    // Gap analysis and synthesis are added to the total once they start
    assert_eq!(plan["data"]["totalSteps"], 2);
    assert!(plan["data"]["plan"]["searchQueries"].is_array());

    let search = envelopes
        .iter()
        .find(|e| e["data"]["id"] == "search-web-0" && e["data"]["status"] == "completed")
        .unwrap();
    assert_eq!(search["data"]["type"], "web");
    assert_eq!(search["data"]["query"], "quic");
    assert_eq!(search["data"]["results"][0]["url"], "https://quic.example");

    let gap = envelopes
        .iter()
        .find(|e| e["data"]["id"] == "gap-analysis" && e["data"]["status"] == "completed")
        .unwrap();
    assert_eq!(gap["data"]["analysisType"], "gaps");
    assert_eq!(gap["data"]["gaps"][0]["additionalQueries"][0], "quic middleboxes");

    let last = envelopes.last().unwrap();
    assert_eq!(last["data"]["type"], "progress");
    assert_eq!(last["data"]["isComplete"], true);
    assert_eq!(last["data"]["completedSteps"], last["data"]["totalSteps"]);
}

#[tokio::test]
async fn test_running_cards_omit_empty_payload() {
    let generator = generator(vec![plan(&[("quic", "web", 3)], &[])]);
    let pipeline = ResearchPipeline::new(generator, search_with(&[]), no_report());
    let (_, events) = run_collecting(&pipeline, "quic").await;

    let first = serde_json::to_value(events[0].envelope()).unwrap();
    let data = first["data"].as_object().unwrap();
    assert_eq!(data["status"], "running");
    for key in ["plan", "results", "findings", "error", "isComplete"] {
        assert!(!data.contains_key(key), "{} should be omitted", key);
    }
}
