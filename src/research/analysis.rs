//! Structured analysis over accumulated search results

use super::error::ResearchError;
use super::types::{AnalysisResult, AnalysisStep, SearchResult, SearchStepOutput};
use crate::llm::{generate_validated, GenerationRequest, TextGeneration};
use crate::search::deduplicate_by_domain_and_url;
use std::sync::Arc;
use tracing::debug;

const ANALYSIS_SCHEMA: &str = "analysis_result";
const ANALYSIS_TEMPERATURE: f32 = 0.5;

const ANALYSIS_SYSTEM: &str = "You are a research assistant. \
Every finding carries a confidence between 0 and 1 expressing how well the evidence supports it. \
Answer with a single JSON object that matches the schema exactly.";

/// Every document gathered so far in step order, duplicates included.
/// Gap analysis and synthesis read this set.
pub fn all_results(outputs: &[SearchStepOutput]) -> Vec<SearchResult> {
    outputs
        .iter()
        .flat_map(|output| output.results.iter().cloned())
        .collect()
}

/// All documents gathered so far, de-duplicated by URL and by domain.
/// The first occurrence wins, so earlier steps take precedence.
pub fn merged_results(outputs: &[SearchStepOutput]) -> Vec<SearchResult> {
    deduplicate_by_domain_and_url(all_results(outputs))
}

pub struct AnalysisEngine {
    client: Arc<dyn TextGeneration>,
}

impl AnalysisEngine {
    pub fn new(client: Arc<dyn TextGeneration>) -> Self {
        Self { client }
    }

    /// Confidence outside `[0, 1]` is rejected and retried once, never
    /// clamped.
    pub async fn analyze(
        &self,
        step: &AnalysisStep,
        results: &[SearchResult],
    ) -> Result<AnalysisResult, ResearchError> {
        let request = GenerationRequest::for_type::<AnalysisResult>(ANALYSIS_SCHEMA)
            .with_system(ANALYSIS_SYSTEM)
            .with_prompt(build_prompt(step, results))
            .with_temperature(ANALYSIS_TEMPERATURE);

        let result: AnalysisResult = generate_validated(self.client.as_ref(), request)
            .await
            .map_err(|source| ResearchError::Analysis {
                step_id: step.id.clone(),
                source,
            })?;

        debug!(
            step = %step.id,
            findings = result.findings.len(),
            "Analysis finished"
        );
        Ok(result)
    }
}

fn build_prompt(step: &AnalysisStep, results: &[SearchResult]) -> String {
    let documents = serde_json::to_string(results).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"Perform a {} analysis on the search results. {}
Consider all sources and their reliability.

Search results: {}"#,
        step.analysis.analysis_type, step.analysis.description, documents
    )
}
