//! Gap analysis and second-pass query derivation

use super::error::ResearchError;
use super::profile::ResearchProfile;
use super::types::{AnalysisSpec, Finding, GapAnalysis, SearchQuerySpec, SearchResult, SourceKind};
use crate::llm::{generate_validated, GenerationRequest, TextGeneration};
use std::sync::Arc;
use tracing::{debug, warn};

const GAP_SCHEMA: &str = "gap_analysis";
const GAP_TEMPERATURE: f32 = 0.0;
const SECOND_PASS_PRIORITY: u8 = 3;
const SECOND_PASS_SOURCES: [SourceKind; 2] = [SourceKind::Web, SourceKind::All];

/// Confidence shown for a limitation: `(6 - severity) / 5`.
///
/// Severities 2..=6 land in `[0, 1]`; higher severities go negative and are
/// reported as they are.
pub fn limitation_confidence(severity: u8) -> f64 {
    (6.0 - f64::from(severity)) / 5.0
}

/// Limitations rendered as findings for the gap card
pub fn limitation_findings(gaps: &GapAnalysis) -> Vec<Finding> {
    gaps.limitations
        .iter()
        .map(|limitation| {
            let confidence = limitation_confidence(limitation.severity);
            if !(0.0..=1.0).contains(&confidence) {
                warn!(
                    severity = limitation.severity,
                    confidence, "Limitation confidence outside [0, 1]"
                );
            }
            Finding {
                insight: limitation.description.clone(),
                evidence: limitation.potential_solutions.clone(),
                confidence,
            }
        })
        .collect()
}

/// Flattens every gap's additional queries into search specs.
///
/// The first query of a gap searches `all` sources; later ones rotate
/// through `[web, all]` with a modulus of one, which always picks `web`.
pub fn second_pass_queries(gaps: &GapAnalysis) -> Vec<SearchQuerySpec> {
    let rotation = SECOND_PASS_SOURCES.len() - 1;
    gaps.knowledge_gaps
        .iter()
        .flat_map(|gap| {
            gap.additional_queries
                .iter()
                .enumerate()
                .map(move |(idx, query)| SearchQuerySpec {
                    query: query.clone(),
                    rationale: gap.reason.clone(),
                    source: if idx == 0 {
                        SourceKind::All
                    } else {
                        SECOND_PASS_SOURCES[idx % rotation]
                    },
                    priority: SECOND_PASS_PRIORITY,
                })
        })
        .collect()
}

pub struct GapAnalyzer {
    client: Arc<dyn TextGeneration>,
    profile: ResearchProfile,
}

impl GapAnalyzer {
    pub fn new(client: Arc<dyn TextGeneration>, profile: ResearchProfile) -> Self {
        Self { client, profile }
    }

    pub async fn analyze(
        &self,
        results: &[SearchResult],
        analyses: &[AnalysisSpec],
    ) -> Result<GapAnalysis, ResearchError> {
        let request = GenerationRequest::for_type::<GapAnalysis>(GAP_SCHEMA)
            .with_system("You are a research reviewer. Answer with a single JSON object that matches the schema exactly.")
            .with_prompt(build_prompt(self.profile, results, analyses))
            .with_temperature(GAP_TEMPERATURE);

        let gaps: GapAnalysis = generate_validated(self.client.as_ref(), request)
            .await
            .map_err(ResearchError::GapAnalysis)?;

        debug!(
            limitations = gaps.limitations.len(),
            knowledge_gaps = gaps.knowledge_gaps.len(),
            followups = gaps.recommended_followup.len(),
            "Gap analysis finished"
        );
        Ok(gaps)
    }
}

fn build_prompt(
    profile: ResearchProfile,
    results: &[SearchResult],
    analyses: &[AnalysisSpec],
) -> String {
    let focus = match profile {
        ResearchProfile::General => "- Areas needing deeper investigation",
        ResearchProfile::Trace => {
            "- Areas needing deeper investigation, always with web performance and Core Web Vitals in mind\n\
             - Prefer web.dev as the main source whenever possible"
        }
    };
    let documents = serde_json::to_string(results).unwrap_or_else(|_| "[]".to_string());
    let analyses = serde_json::to_string(analyses).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Analyze the research results and identify limitations, knowledge gaps, and recommended follow-up actions.
Consider:
- Quality and reliability of sources
- Missing alignment to the main topic or missing data
{focus}
- Limitation severity and follow-up priority are whole numbers between 2 and 10; keep them reasonable

additionalQueries of each knowledge gap will be sent to a web search engine, so phrase them as search queries.

Research results: {documents}
Analyses performed: {analyses}"#
    )
}
