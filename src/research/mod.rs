//! Research stages
//!
//! Each stage is a small component over the text generation or web search
//! seam. Stages report failures; the pipeline controller decides whether a
//! failure ends the run.

mod analysis;
mod error;
pub mod gaps;
mod plan;
mod profile;
mod report;
mod search_step;
pub mod steps;
mod synthesis;
pub mod types;

pub use analysis::{all_results, merged_results, AnalysisEngine};
pub use error::ResearchError;
pub use gaps::{limitation_confidence, limitation_findings, second_pass_queries, GapAnalyzer};
pub use plan::PlanGenerator;
pub use profile::ResearchProfile;
pub use report::ReportWriter;
pub use search_step::{max_results_for_priority, SearchExecutor, GAP_SEARCH_MAX_RESULTS};
pub use steps::{expand, PLAN_ID};
pub use synthesis::{synthesis_findings, Synthesizer};
pub use types::{
    AnalysisResult, AnalysisSpec, AnalysisStep, Depth, Finding, Followup, GapAnalysis,
    KeyFinding, KnowledgeGap, Limitation, ResearchPlan, SearchQuerySpec, SearchResult,
    SearchStep, SearchStepOutput, SourceKind, StepKind, StepPlan, Synthesis,
    MAX_REQUIRED_ANALYSES, MAX_SEARCH_QUERIES,
};
