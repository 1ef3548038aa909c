//! Progress cards for each pipeline transition
//!
//! One constructor per card state so the controller never assembles event
//! payloads by hand.

use super::event::{EventKind, EventPayload, ProgressEvent};
use crate::research::{
    limitation_findings, synthesis_findings, AnalysisResult, AnalysisStep, GapAnalysis,
    ResearchPlan, SearchQuerySpec, SearchStepOutput, StepKind, Synthesis, PLAN_ID,
};

pub const PLAN_INITIAL_ID: &str = "research-plan-initial";
pub const PROGRESS_ID: &str = "research-progress";
pub const GAP_ANALYSIS_ID: &str = "gap-analysis";
pub const SYNTHESIS_ID: &str = "final-synthesis";

const PLAN_TITLE: &str = "Research Plan";
const PROGRESS_TITLE: &str = "Research Progress";
const GAP_TITLE: &str = "Research Gaps and Limitations";
const SYNTHESIS_TITLE: &str = "Final Research Synthesis";

pub fn plan_started() -> ProgressEvent {
    ProgressEvent::running(
        PLAN_INITIAL_ID,
        EventKind::Plan,
        PLAN_TITLE,
        "Creating research plan...",
    )
    .with_overwrite(true)
}

pub fn plan_ready(plan: &ResearchPlan, total_steps: usize) -> ProgressEvent {
    ProgressEvent::completed(PLAN_ID, EventKind::Plan, PLAN_TITLE, "Research plan created")
        .with_total_steps(total_steps)
        .with_payload(EventPayload {
            plan: Some(plan.clone()),
            ..Default::default()
        })
}

pub fn plan_failed(error: &str) -> ProgressEvent {
    ProgressEvent::completed(
        PLAN_ID,
        EventKind::Plan,
        PLAN_TITLE,
        "Research plan could not be created",
    )
    .with_payload(error_payload(error))
}

fn search_verb(kind: StepKind, done: bool) -> &'static str {
    match (kind, done) {
        (StepKind::Academic, false) => "Searching academic papers for",
        (StepKind::Academic, true) => "Searched academic papers for",
        (_, false) => "Searching the web for",
        (_, true) => "Searched the web for",
    }
}

pub fn search_started(id: &str, kind: StepKind, query: &SearchQuerySpec) -> ProgressEvent {
    ProgressEvent::running(
        id,
        kind.into(),
        format!("{} \"{}\"", search_verb(kind, false), query.query),
        format!("Searching {} sources...", query.source),
    )
    .with_payload(EventPayload {
        query: Some(query.query.clone()),
        ..Default::default()
    })
}

fn found_message(output: &SearchStepOutput) -> String {
    match &output.error {
        Some(error) => format!("Search failed: {}", error),
        None => format!("Found {} results", output.results.len()),
    }
}

fn search_payload(output: &SearchStepOutput) -> EventPayload {
    EventPayload {
        query: Some(output.query.query.clone()),
        results: Some(output.results.clone()),
        error: output.error.clone(),
        ..Default::default()
    }
}

pub fn search_finished(output: &SearchStepOutput) -> ProgressEvent {
    ProgressEvent::completed(
        output.step_id.as_str(),
        output.kind.into(),
        format!("{} \"{}\"", search_verb(output.kind, true), output.query.query),
        found_message(output),
    )
    .with_payload(search_payload(output))
}

pub fn gap_search_started(id: &str, query: &SearchQuerySpec) -> ProgressEvent {
    ProgressEvent::running(
        id,
        EventKind::Web,
        format!("Additional web search for \"{}\"", query.query),
        "Searching additional sources...",
    )
    .with_payload(EventPayload {
        query: Some(query.query.clone()),
        ..Default::default()
    })
}

pub fn gap_search_finished(output: &SearchStepOutput) -> ProgressEvent {
    ProgressEvent::completed(
        output.step_id.as_str(),
        EventKind::Web,
        format!("Additional web search for \"{}\"", output.query.query),
        found_message(output),
    )
    .with_payload(search_payload(output))
}

pub fn analysis_started(step: &AnalysisStep) -> ProgressEvent {
    let kind = &step.analysis.analysis_type;
    ProgressEvent::running(
        step.id.as_str(),
        EventKind::Analysis,
        format!("Analyzing {}", kind),
        format!("Analyzing {}...", kind),
    )
    .with_payload(EventPayload {
        analysis_type: Some(kind.clone()),
        ..Default::default()
    })
}

pub fn analysis_finished(
    step: &AnalysisStep,
    result: &AnalysisResult,
    error: Option<&str>,
) -> ProgressEvent {
    let kind = &step.analysis.analysis_type;
    let message = match error {
        Some(e) => format!("Analysis failed: {}", e),
        None => "Analysis complete".to_string(),
    };
    ProgressEvent::completed(
        step.id.as_str(),
        EventKind::Analysis,
        format!("Analysis of {} complete", kind),
        message,
    )
    .with_payload(EventPayload {
        analysis_type: Some(kind.clone()),
        findings: Some(result.findings.clone()),
        error: error.map(str::to_string),
        ..Default::default()
    })
}

pub fn gap_analysis_started() -> ProgressEvent {
    ProgressEvent::running(
        GAP_ANALYSIS_ID,
        EventKind::Analysis,
        GAP_TITLE,
        "Analyzing research gaps and limitations...",
    )
    .with_payload(EventPayload {
        analysis_type: Some("gaps".to_string()),
        ..Default::default()
    })
}

pub fn gap_analysis_finished(gaps: &GapAnalysis, completed: usize, total: usize) -> ProgressEvent {
    ProgressEvent::completed(
        GAP_ANALYSIS_ID,
        EventKind::Analysis,
        GAP_TITLE,
        format!(
            "Identified {} limitations and {} knowledge gaps",
            gaps.limitations.len(),
            gaps.knowledge_gaps.len()
        ),
    )
    .with_steps(completed, total)
    .with_payload(EventPayload {
        analysis_type: Some("gaps".to_string()),
        findings: Some(limitation_findings(gaps)),
        gaps: Some(gaps.knowledge_gaps.clone()),
        recommendations: Some(gaps.recommended_followup.clone()),
        ..Default::default()
    })
}

pub fn gap_analysis_failed(error: &str, completed: usize, total: usize) -> ProgressEvent {
    ProgressEvent::completed(
        GAP_ANALYSIS_ID,
        EventKind::Analysis,
        GAP_TITLE,
        format!("Gap analysis failed: {}", error),
    )
    .with_steps(completed, total)
    .with_payload(EventPayload {
        analysis_type: Some("gaps".to_string()),
        error: Some(error.to_string()),
        ..Default::default()
    })
}

pub fn synthesis_started() -> ProgressEvent {
    ProgressEvent::running(
        SYNTHESIS_ID,
        EventKind::Analysis,
        SYNTHESIS_TITLE,
        "Synthesizing all research findings...",
    )
    .with_payload(EventPayload {
        analysis_type: Some("synthesis".to_string()),
        ..Default::default()
    })
}

pub fn synthesis_finished(synthesis: &Synthesis, completed: usize, total: usize) -> ProgressEvent {
    ProgressEvent::completed(
        SYNTHESIS_ID,
        EventKind::Analysis,
        SYNTHESIS_TITLE,
        format!("Synthesized {} key findings", synthesis.key_findings.len()),
    )
    .with_steps(completed, total)
    .with_payload(EventPayload {
        analysis_type: Some("synthesis".to_string()),
        findings: Some(synthesis_findings(synthesis)),
        uncertainties: Some(synthesis.remaining_uncertainties.clone()),
        ..Default::default()
    })
}

pub fn synthesis_failed(error: &str, completed: usize, total: usize) -> ProgressEvent {
    ProgressEvent::completed(
        SYNTHESIS_ID,
        EventKind::Analysis,
        SYNTHESIS_TITLE,
        format!("Synthesis failed: {}", error),
    )
    .with_steps(completed, total)
    .with_payload(EventPayload {
        analysis_type: Some("synthesis".to_string()),
        error: Some(error.to_string()),
        ..Default::default()
    })
}

/// Run-level card, re-sent at every state transition
pub fn run_progress(phase: &str, completed: usize, total: usize) -> ProgressEvent {
    ProgressEvent::running(
        PROGRESS_ID,
        EventKind::Progress,
        PROGRESS_TITLE,
        format!("{}: {}/{} steps finished", phase, completed, total),
    )
    .with_steps(completed, total)
    .with_overwrite(true)
}

pub fn run_finished(completed: usize, total: usize) -> ProgressEvent {
    ProgressEvent::completed(
        PROGRESS_ID,
        EventKind::Progress,
        PROGRESS_TITLE,
        format!("Research complete: {}/{} steps finished", completed, total),
    )
    .with_steps(completed, total)
    .finished()
}

pub fn run_failed(error: &str, completed: usize, total: usize) -> ProgressEvent {
    ProgressEvent::completed(
        PROGRESS_ID,
        EventKind::Progress,
        PROGRESS_TITLE,
        format!("Research failed: {}", error),
    )
    .with_steps(completed, total)
    .with_payload(error_payload(error))
    .finished()
}

fn error_payload(error: &str) -> EventPayload {
    EventPayload {
        error: Some(error.to_string()),
        ..Default::default()
    }
}
