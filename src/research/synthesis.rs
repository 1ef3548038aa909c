//! Final synthesis after a second research pass

use super::error::ResearchError;
use super::types::{Finding, GapAnalysis, SearchQuerySpec, SearchResult, Synthesis};
use crate::llm::{generate_validated, GenerationRequest, TextGeneration};
use std::sync::Arc;
use tracing::debug;

const SYNTHESIS_SCHEMA: &str = "synthesis";
const SYNTHESIS_TEMPERATURE: f32 = 0.0;

/// Key findings in the same shape the analysis cards use
pub fn synthesis_findings(synthesis: &Synthesis) -> Vec<Finding> {
    synthesis
        .key_findings
        .iter()
        .map(|f| Finding {
            insight: f.finding.clone(),
            evidence: f.supporting_evidence.clone(),
            confidence: f.confidence,
        })
        .collect()
}

pub struct Synthesizer {
    client: Arc<dyn TextGeneration>,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn TextGeneration>) -> Self {
        Self { client }
    }

    pub async fn synthesize(
        &self,
        results: &[SearchResult],
        gaps: &GapAnalysis,
        additional_queries: &[SearchQuerySpec],
    ) -> Result<Synthesis, ResearchError> {
        let request = GenerationRequest::for_type::<Synthesis>(SYNTHESIS_SCHEMA)
            .with_system("You are a research assistant. Answer with a single JSON object that matches the schema exactly.")
            .with_prompt(build_prompt(results, gaps, additional_queries))
            .with_temperature(SYNTHESIS_TEMPERATURE);

        let synthesis: Synthesis = generate_validated(self.client.as_ref(), request)
            .await
            .map_err(ResearchError::Synthesis)?;

        debug!(
            key_findings = synthesis.key_findings.len(),
            uncertainties = synthesis.remaining_uncertainties.len(),
            "Synthesis finished"
        );
        Ok(synthesis)
    }
}

fn build_prompt(
    results: &[SearchResult],
    gaps: &GapAnalysis,
    additional_queries: &[SearchQuerySpec],
) -> String {
    let to_json = |value: serde_json::Result<String>| value.unwrap_or_else(|_| "null".to_string());
    format!(
        r#"Synthesize all research findings, including the gap analysis and the follow-up research.
Highlight key conclusions and remaining uncertainties.
Confidence scores are numbers between 0 and 1.

Results: {}
Gap analysis: {}
Follow-up queries: {}"#,
        to_json(serde_json::to_string(results)),
        to_json(serde_json::to_string(gaps)),
        to_json(serde_json::to_string(additional_queries)),
    )
}
