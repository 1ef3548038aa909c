use crate::research::{
    merged_results, AnalysisResult, Depth, GapAnalysis, ResearchPlan, ResearchProfile,
    SearchQuerySpec, SearchResult, SearchStepOutput, Synthesis,
};
use serde::{Deserialize, Serialize};

/// One executed analysis step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub step_id: String,
    pub analysis_type: String,
    pub result: AnalysisResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a finished run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOutcome {
    pub run_id: String,
    pub topic: String,
    pub depth: Depth,
    pub profile: ResearchProfile,
    pub plan: ResearchPlan,
    /// Plan searches in plan order, then second-pass searches
    pub results: Vec<SearchStepOutput>,
    pub analyses: Vec<AnalysisOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_analysis: Option<GapAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_queries: Vec<SearchQuerySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<Synthesis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    pub completed_steps: usize,
    pub total_steps: usize,
}

impl ResearchOutcome {
    /// De-duplicated view over every document the run found
    pub fn sources(&self) -> Vec<SearchResult> {
        merged_results(&self.results)
    }

    pub fn failed_searches(&self) -> impl Iterator<Item = &SearchStepOutput> {
        self.results.iter().filter(|r| r.error.is_some())
    }
}
