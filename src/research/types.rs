//! Research artifacts: plans, steps, search results and model-produced
//! analyses.
//!
//! Field names serialise in camelCase because these values travel verbatim
//! inside progress events. The JSON Schemas handed to the model are derived
//! from the same types.

use crate::llm::{check_range, ContractViolation, Validate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_SEARCH_QUERIES: usize = 12;
pub const MAX_REQUIRED_ANALYSES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Basic,
    Advanced,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Basic => "basic",
            Depth::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a planned query should be searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Academic,
    /// Expands into a web step and an academic step
    Both,
    /// Broadest search; executed as a single web step
    All,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Web => "web",
            SourceKind::Academic => "academic",
            SourceKind::Both => "both",
            SourceKind::All => "all",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Web,
    Academic,
    Analysis,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Web => "web",
            StepKind::Academic => "academic",
            StepKind::Analysis => "analysis",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuerySpec {
    pub query: String,
    pub rationale: String,
    pub source: SourceKind,
    /// Whole number, 1 (most important) to 5
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSpec {
    #[serde(rename = "type")]
    pub analysis_type: String,
    pub description: String,
    /// Whole number, 1 to 5
    pub importance: u8,
}

/// A research plan. Created once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPlan {
    pub search_queries: Vec<SearchQuerySpec>,
    pub required_analyses: Vec<AnalysisSpec>,
}

impl ResearchPlan {
    /// Clamps every priority into `[min, max]`
    pub fn clamp_priorities(&mut self, min: u8, max: u8) {
        for query in &mut self.search_queries {
            query.priority = query.priority.clamp(min, max);
        }
    }
}

impl Validate for ResearchPlan {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.search_queries.len() > MAX_SEARCH_QUERIES {
            return Err(ContractViolation::new(
                "searchQueries",
                format!(
                    "{} queries, at most {} allowed",
                    self.search_queries.len(),
                    MAX_SEARCH_QUERIES
                ),
            ));
        }
        if self.required_analyses.len() > MAX_REQUIRED_ANALYSES {
            return Err(ContractViolation::new(
                "requiredAnalyses",
                format!(
                    "{} analyses, at most {} allowed",
                    self.required_analyses.len(),
                    MAX_REQUIRED_ANALYSES
                ),
            ));
        }
        for (i, query) in self.search_queries.iter().enumerate() {
            check_range(&format!("searchQueries[{}].priority", i), query.priority, 1, 5)?;
        }
        for (i, analysis) in self.required_analyses.iter().enumerate() {
            check_range(
                &format!("requiredAnalyses[{}].importance", i),
                analysis.importance,
                1,
                5,
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStep {
    pub id: String,
    pub kind: StepKind,
    pub query: SearchQuerySpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStep {
    pub id: String,
    pub analysis: AnalysisSpec,
}

/// Identified steps of a plan, in execution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPlan {
    pub plan_id: String,
    pub search_steps: Vec<SearchStep>,
    pub analysis_steps: Vec<AnalysisStep>,
}

impl StepPlan {
    pub fn step_count(&self) -> usize {
        self.search_steps.len() + self.analysis_steps.len()
    }
}

/// A normalized search document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub source: StepKind,
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// The documents one executed search produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStepOutput {
    pub step_id: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub query: SearchQuerySpec,
    pub results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchStepOutput {
    pub fn empty(step_id: &str, kind: StepKind, query: &SearchQuerySpec) -> Self {
        Self {
            step_id: step_id.to_string(),
            kind,
            query: query.clone(),
            results: Vec::new(),
            error: None,
        }
    }

    /// A step that produced nothing because the search failed
    pub fn failed(step_id: &str, kind: StepKind, query: &SearchQuerySpec, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::empty(step_id, kind, query)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub insight: String,
    pub evidence: Vec<String>,
    /// Between 0 and 1
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub findings: Vec<Finding>,
    pub implications: Vec<String>,
    pub limitations: Vec<String>,
}

fn check_unit_interval(field: &str, value: f64) -> Result<(), ContractViolation> {
    if !value.is_finite() {
        return Err(ContractViolation::new(field, "confidence must be a finite number"));
    }
    check_range(field, value, 0.0, 1.0)
}

impl Validate for AnalysisResult {
    fn validate(&self) -> Result<(), ContractViolation> {
        for (i, finding) in self.findings.iter().enumerate() {
            check_unit_interval(&format!("findings[{}].confidence", i), finding.confidence)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Limitation {
    #[serde(rename = "type")]
    pub limitation_type: String,
    pub description: String,
    /// Whole number, 2 to 10
    pub severity: u8,
    pub potential_solutions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGap {
    pub topic: String,
    pub reason: String,
    pub additional_queries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Followup {
    pub action: String,
    pub rationale: String,
    /// Whole number, 2 to 10
    pub priority: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysis {
    pub limitations: Vec<Limitation>,
    pub knowledge_gaps: Vec<KnowledgeGap>,
    pub recommended_followup: Vec<Followup>,
}

impl Validate for GapAnalysis {
    fn validate(&self) -> Result<(), ContractViolation> {
        for (i, limitation) in self.limitations.iter().enumerate() {
            check_range(
                &format!("limitations[{}].severity", i),
                limitation.severity,
                2,
                10,
            )?;
        }
        for (i, followup) in self.recommended_followup.iter().enumerate() {
            check_range(
                &format!("recommendedFollowup[{}].priority", i),
                followup.priority,
                2,
                10,
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyFinding {
    pub finding: String,
    /// Between 0 and 1
    pub confidence: f64,
    pub supporting_evidence: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Synthesis {
    pub key_findings: Vec<KeyFinding>,
    pub remaining_uncertainties: Vec<String>,
}

impl Validate for Synthesis {
    fn validate(&self) -> Result<(), ContractViolation> {
        for (i, finding) in self.key_findings.iter().enumerate() {
            check_unit_interval(&format!("keyFindings[{}].confidence", i), finding.confidence)?;
        }
        Ok(())
    }
}
