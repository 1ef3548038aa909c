//! Free-form research report streamed from the text generation backend

use super::error::ResearchError;
use super::types::{ResearchPlan, SearchStepOutput, Synthesis};
use crate::llm::{ChatMessage, TextGeneration};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::debug;

const REPORT_SYSTEM: &str = "You are a research assistant writing a report for a technical reader. \
Use markdown headings, cite sources inline by URL, and separate established findings from open questions.";

pub struct ReportWriter {
    client: Arc<dyn TextGeneration>,
}

impl ReportWriter {
    pub fn new(client: Arc<dyn TextGeneration>) -> Self {
        Self { client }
    }

    /// Streams the report and returns the concatenated text. A broken
    /// stream fails the whole report; partial text is discarded.
    pub async fn write(
        &self,
        topic: &str,
        plan: &ResearchPlan,
        results: &[SearchStepOutput],
        synthesis: Option<&Synthesis>,
    ) -> Result<String, ResearchError> {
        let messages = vec![ChatMessage::user(build_prompt(topic, plan, results, synthesis))];

        let mut stream = self
            .client
            .stream_text(REPORT_SYSTEM, messages)
            .await
            .map_err(ResearchError::Report)?;

        let mut report = String::new();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            report.push_str(&chunk.map_err(ResearchError::Report)?);
            chunks += 1;
        }

        debug!(chunks, chars = report.len(), "Report streamed");
        Ok(report)
    }
}

fn build_prompt(
    topic: &str,
    plan: &ResearchPlan,
    results: &[SearchStepOutput],
    synthesis: Option<&Synthesis>,
) -> String {
    let plan = serde_json::to_string(plan).unwrap_or_default();
    let results = serde_json::to_string(results).unwrap_or_default();
    let synthesis = synthesis
        .and_then(|s| serde_json::to_string(s).ok())
        .unwrap_or_else(|| "none".to_string());

    format!(
        "Write a research report on \"{topic}\".\n\n\
         Research plan: {plan}\n\
         Search results: {results}\n\
         Synthesis: {synthesis}"
    )
}
