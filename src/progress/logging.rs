//! Logging-based progress handler

use super::cards::{GAP_ANALYSIS_ID, SYNTHESIS_ID};
use super::event::{EventKind, EventStatus, ProgressEvent};
use super::handler::ProgressHandler;
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing.
///
/// Phase cards log at info, per-step cards at debug, failures at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        if let Some(error) = &event.payload.error {
            warn!(id = %event.id, error = %error, "{}", event.message);
            return;
        }

        let phase_card = matches!(event.kind, EventKind::Plan | EventKind::Progress)
            || event.id == GAP_ANALYSIS_ID
            || event.id == SYNTHESIS_ID;

        match (phase_card, event.status) {
            (true, EventStatus::Running) => {
                info!(id = %event.id, "{}", event.title);
            }
            (true, EventStatus::Completed) => {
                info!(
                    id = %event.id,
                    completed = ?event.completed_steps,
                    total = ?event.total_steps,
                    "{}",
                    event.message
                );
            }
            (false, EventStatus::Running) => {
                debug!(id = %event.id, kind = ?event.kind, "{}", event.title);
            }
            (false, EventStatus::Completed) => {
                debug!(
                    id = %event.id,
                    results = event.payload.results.as_ref().map(Vec::len),
                    "{}",
                    event.message
                );
            }
        }
    }
}
