//! Progress events and their wire envelope
//!
//! Events sharing an `id` form one logical card that moves from `running` to
//! `completed`. Field names are part of the consumer contract.

use crate::research::{Finding, Followup, KnowledgeGap, ResearchPlan, SearchResult, StepKind};
use serde::{Deserialize, Serialize};

pub const ENVELOPE_TYPE: &str = "research_update";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Plan,
    Web,
    Academic,
    Analysis,
    Progress,
}

impl From<StepKind> for EventKind {
    fn from(kind: StepKind) -> Self {
        match kind {
            StepKind::Web => EventKind::Web,
            StepKind::Academic => EventKind::Academic,
            StepKind::Analysis => EventKind::Analysis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Running,
    Completed,
}

/// Card contents. Only the fields relevant to a card are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<ResearchPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SearchResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<Vec<Finding>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaps: Option<Vec<KnowledgeGap>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Followup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventPayload {
    pub fn is_empty(&self) -> bool {
        *self == EventPayload::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub status: EventStatus,
    pub title: String,
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_steps: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl ProgressEvent {
    fn new(
        id: impl Into<String>,
        kind: EventKind,
        status: EventStatus,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            status,
            title: title.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            completed_steps: None,
            total_steps: None,
            is_complete: None,
            overwrite: false,
            payload: EventPayload::default(),
        }
    }

    pub fn running(
        id: impl Into<String>,
        kind: EventKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, kind, EventStatus::Running, title, message)
    }

    /// A completed event replaces its running card, so `overwrite` is set
    pub fn completed(
        id: impl Into<String>,
        kind: EventKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut event = Self::new(id, kind, EventStatus::Completed, title, message);
        event.overwrite = true;
        event
    }

    pub fn with_steps(mut self, completed: usize, total: usize) -> Self {
        self.completed_steps = Some(completed);
        self.total_steps = Some(total);
        self
    }

    pub fn with_total_steps(mut self, total: usize) -> Self {
        self.total_steps = Some(total);
        self
    }

    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Marks the terminal event of a run
    pub fn finished(mut self) -> Self {
        self.is_complete = Some(true);
        self.overwrite = true;
        self
    }

    pub fn is_running(&self) -> bool {
        self.status == EventStatus::Running
    }

    pub fn envelope(&self) -> ResearchUpdate {
        ResearchUpdate {
            envelope_type: ENVELOPE_TYPE.to_string(),
            data: self.clone(),
        }
    }
}

/// `{"type": "research_update", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchUpdate {
    #[serde(rename = "type")]
    pub envelope_type: String,
    pub data: ProgressEvent,
}
