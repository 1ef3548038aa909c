//! Step identification
//!
//! Turns a plan into executable steps with IDs derived only from plan
//! position, so the same plan always yields the same cards.

use super::types::{AnalysisStep, ResearchPlan, SearchStep, SourceKind, StepKind, StepPlan};

pub const PLAN_ID: &str = "research-plan";

/// Expands `plan` into search and analysis steps.
///
/// `both` becomes a web step followed by an academic step sharing the query;
/// `all` becomes a single web step.
pub fn expand(plan: &ResearchPlan) -> StepPlan {
    let search_steps = plan
        .search_queries
        .iter()
        .enumerate()
        .flat_map(|(index, query)| {
            let kinds: &[StepKind] = match query.source {
                SourceKind::Both => &[StepKind::Web, StepKind::Academic],
                SourceKind::Academic => &[StepKind::Academic],
                SourceKind::Web | SourceKind::All => &[StepKind::Web],
            };
            kinds.iter().map(move |kind| SearchStep {
                id: format!("search-{}-{}", kind, index),
                kind: *kind,
                query: query.clone(),
            })
        })
        .collect();

    let analysis_steps = plan
        .required_analyses
        .iter()
        .enumerate()
        .map(|(index, analysis)| AnalysisStep {
            id: format!("analysis-{}", index),
            analysis: analysis.clone(),
        })
        .collect();

    StepPlan {
        plan_id: PLAN_ID.to_string(),
        search_steps,
        analysis_steps,
    }
}
