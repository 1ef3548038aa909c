//! Research plan generation

use super::error::ResearchError;
use super::profile::ResearchProfile;
use super::steps::expand;
use super::types::{Depth, ResearchPlan, MAX_REQUIRED_ANALYSES, MAX_SEARCH_QUERIES};
use crate::llm::{generate_validated, GenerationRequest, TextGeneration};
use std::sync::Arc;
use tracing::{info, warn};

const PLAN_SCHEMA: &str = "research_plan";
const PLAN_TEMPERATURE: f32 = 0.5;

pub struct PlanGenerator {
    client: Arc<dyn TextGeneration>,
    profile: ResearchProfile,
}

impl PlanGenerator {
    pub fn new(client: Arc<dyn TextGeneration>, profile: ResearchProfile) -> Self {
        Self { client, profile }
    }

    /// Produces a validated plan with priorities clamped to the profile's
    /// range. There is no fallback plan: a second bad answer fails the run.
    pub async fn generate(
        &self,
        topic: &str,
        depth: Depth,
        domain_hints: &[String],
    ) -> Result<ResearchPlan, ResearchError> {
        let request = GenerationRequest::for_type::<ResearchPlan>(PLAN_SCHEMA)
            .with_system(system_prompt(self.profile))
            .with_prompt(build_prompt(topic, depth, self.profile, domain_hints))
            .with_temperature(PLAN_TEMPERATURE);

        let mut plan: ResearchPlan = generate_validated(self.client.as_ref(), request)
            .await
            .map_err(ResearchError::PlanGeneration)?;

        let (min, max) = self.profile.priority_range();
        plan.clamp_priorities(min, max);

        let steps = expand(&plan).step_count();
        if steps > self.profile.step_ceiling() {
            warn!(
                steps,
                ceiling = self.profile.step_ceiling(),
                "Research plan exceeds the step ceiling; continuing"
            );
        }

        info!(
            queries = plan.search_queries.len(),
            analyses = plan.required_analyses.len(),
            steps,
            "Research plan created"
        );
        Ok(plan)
    }
}

fn system_prompt(profile: ResearchProfile) -> String {
    let (min, max) = profile.priority_range();
    format!(
        r#"You are a research assistant.
Pay attention to the depth and the topic.
Query priorities are whole numbers between {min} and {max}; analysis importance is a whole number between 1 and 5.
Answer with a single JSON object that matches the schema exactly."#
    )
}

fn build_prompt(
    topic: &str,
    depth: Depth,
    profile: ResearchProfile,
    domain_hints: &[String],
) -> String {
    let sources: Vec<&str> = profile
        .allowed_sources()
        .iter()
        .map(|s| s.as_str())
        .collect();

    let focus = match profile {
        ResearchProfile::General => {
            "Consider different angles and potential controversies, but stay on the core aspects."
        }
        ResearchProfile::Trace => {
            "Focus on web performance: Core Web Vitals (LCP, INP, CLS), loading, \
             rendering and resource optimization."
        }
    };

    let domains = if domain_hints.is_empty() {
        String::new()
    } else {
        format!("\nPrefer these sites where relevant: {}", domain_hints.join(", "))
    };

    format!(
        r#"Create a focused research plan for the topic: "{topic}".
Research depth: {depth}

Keep the plan concise but comprehensive, with:
- 4-{queries} targeted search queries (source is one of: {sources})
- 2-{analyses} key analyses to perform
- priorities reflecting the most important aspects to investigate

{focus}
Ensure the total number of steps (searches + analyses) does not exceed {ceiling}.{domains}"#,
        queries = MAX_SEARCH_QUERIES,
        analyses = MAX_REQUIRED_ANALYSES,
        sources = sources.join(", "),
        ceiling = profile.step_ceiling(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockGeneration, MockTextGeneration};
    use serde_json::json;

    fn plan_json(priorities: &[u8]) -> serde_json::Value {
        let queries: Vec<_> = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| {
                json!({"query": format!("q{}", i), "rationale": "r", "source": "web", "priority": p})
            })
            .collect();
        json!({
            "searchQueries": queries,
            "requiredAnalyses": [{"type": "overview", "description": "d", "importance": 3}]
        })
    }

    #[tokio::test]
    async fn test_trace_profile_clamps_priorities() {
        let client = Arc::new(MockTextGeneration::new());
        client.add_response(MockGeneration::json(plan_json(&[1, 3, 5])));

        let generator = PlanGenerator::new(client.clone(), ResearchProfile::Trace);
        let plan = generator
            .generate("LCP regressions", Depth::Basic, &[])
            .await
            .unwrap();

        let priorities: Vec<u8> = plan.search_queries.iter().map(|q| q.priority).collect();
        assert_eq!(priorities, vec![2, 3, 4]);

        let request = &client.requests()[0];
        assert_eq!(request.schema_name, "research_plan");
        assert_eq!(request.temperature, Some(0.5));
        assert!(request.prompt.contains("does not exceed 10"));
    }

    #[tokio::test]
    async fn test_out_of_range_priority_repaired_once() {
        let client = Arc::new(MockTextGeneration::new());
        client.add_response(MockGeneration::json(plan_json(&[6])));
        client.add_response(MockGeneration::json(plan_json(&[2])));

        let generator = PlanGenerator::new(client.clone(), ResearchProfile::General);
        let plan = generator.generate("topic", Depth::Advanced, &[]).await.unwrap();

        assert_eq!(plan.search_queries[0].priority, 2);
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].repair_note.is_some());
    }

    #[tokio::test]
    async fn test_second_invalid_answer_is_fatal() {
        let client = Arc::new(MockTextGeneration::new());
        client.add_response(MockGeneration::json(json!({"searchQueries": "nope"})));
        client.add_response(MockGeneration::json(plan_json(&[9])));

        let generator = PlanGenerator::new(client, ResearchProfile::General);
        let err = generator.generate("topic", Depth::Basic, &[]).await.unwrap_err();
        assert!(matches!(err, ResearchError::PlanGeneration(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_plan_over_ceiling_is_tolerated() {
        let client = Arc::new(MockTextGeneration::new());
        let queries: Vec<_> = (0..12)
            .map(|i| json!({"query": format!("q{}", i), "rationale": "r", "source": "both", "priority": 3}))
            .collect();
        client.add_response(MockGeneration::json(json!({
            "searchQueries": queries,
            "requiredAnalyses": []
        })));

        let generator = PlanGenerator::new(client, ResearchProfile::General);
        let plan = generator.generate("topic", Depth::Basic, &[]).await.unwrap();
        assert_eq!(expand(&plan).step_count(), 24);
    }

    #[test]
    fn test_prompt_mentions_domain_hints() {
        let prompt = build_prompt(
            "INP",
            Depth::Basic,
            ResearchProfile::Trace,
            &["web.dev".to_string()],
        );
        assert!(prompt.contains("\"INP\""));
        assert!(prompt.contains("web, all"));
        assert!(prompt.contains("web.dev"));
    }
}
