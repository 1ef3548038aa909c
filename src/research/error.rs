//! Research pipeline errors
//!
//! Only the controller decides whether an error ends the run; stage
//! components just report what went wrong.

use crate::llm::{GenerationError, StructuredError};
use crate::progress::ConsumerGone;
use crate::search::SearchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("research plan generation failed: {0}")]
    PlanGeneration(#[source] StructuredError),

    #[error("search step {step_id} failed: {source}")]
    SearchStep {
        step_id: String,
        #[source]
        source: SearchError,
    },

    #[error("analysis {step_id} failed: {source}")]
    Analysis {
        step_id: String,
        #[source]
        source: StructuredError,
    },

    #[error("gap analysis failed: {0}")]
    GapAnalysis(#[source] StructuredError),

    #[error("synthesis failed: {0}")]
    Synthesis(#[source] StructuredError),

    #[error("report generation failed: {0}")]
    Report(#[source] GenerationError),

    #[error("research run cancelled")]
    Cancelled,

    #[error("research run exceeded its {seconds}s deadline")]
    DeadlineExceeded { seconds: u64 },

    #[error("research task aborted: {0}")]
    Aborted(String),
}

impl ResearchError {
    /// Errors that end the run. Everything else degrades a single stage.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResearchError::PlanGeneration(_)
                | ResearchError::Cancelled
                | ResearchError::DeadlineExceeded { .. }
                | ResearchError::Aborted(_)
        )
    }

    /// True when a collaborator timeout caused the failure
    pub fn is_timeout(&self) -> bool {
        let structured = match self {
            ResearchError::SearchStep { source, .. } => {
                return matches!(source, SearchError::Timeout { .. })
            }
            ResearchError::Report(source) => return source.is_timeout(),
            ResearchError::DeadlineExceeded { .. } => return true,
            ResearchError::PlanGeneration(e)
            | ResearchError::Analysis { source: e, .. }
            | ResearchError::GapAnalysis(e)
            | ResearchError::Synthesis(e) => e,
            ResearchError::Cancelled | ResearchError::Aborted(_) => return false,
        };
        matches!(
            structured,
            StructuredError::Generation { source, .. } if source.is_timeout()
        )
    }
}

impl From<ConsumerGone> for ResearchError {
    fn from(_: ConsumerGone) -> Self {
        ResearchError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> StructuredError {
        StructuredError::Generation {
            schema: "gap_analysis".to_string(),
            source: GenerationError::TimeoutError { seconds: 120 },
        }
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ResearchError::Cancelled.is_fatal());
        assert!(ResearchError::PlanGeneration(timeout()).is_fatal());
        assert!(!ResearchError::GapAnalysis(timeout()).is_fatal());
        assert!(!ResearchError::SearchStep {
            step_id: "search-web-0".to_string(),
            source: SearchError::Transport("reset".to_string()),
        }
        .is_fatal());
    }

    #[test]
    fn test_timeouts_surface_as_local_errors() {
        let err = ResearchError::GapAnalysis(timeout());
        assert!(err.is_timeout());
        assert!(!err.is_fatal());

        let err = ResearchError::SearchStep {
            step_id: "search-web-1".to_string(),
            source: SearchError::Timeout { seconds: 30 },
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("search-web-1"));
    }

    #[test]
    fn test_consumer_gone_is_cancellation() {
        let err: ResearchError = ConsumerGone.into();
        assert!(matches!(err, ResearchError::Cancelled));
    }
}
