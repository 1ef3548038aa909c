//! Run state machine and step accounting

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Planning,
    Searching,
    Analyzing,
    GapAnalysis,
    DeepSearching,
    Synthesizing,
    ReportGeneration,
    Done,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Planning => "Planning",
            PipelineState::Searching => "Searching",
            PipelineState::Analyzing => "Analyzing",
            PipelineState::GapAnalysis => "Gap analysis",
            PipelineState::DeepSearching => "Deep searching",
            PipelineState::Synthesizing => "Synthesizing",
            PipelineState::ReportGeneration => "Report generation",
            PipelineState::Done => "Done",
        }
    }

    /// Legal successors. The gap branch may be skipped, and the second pass
    /// only follows a gap analysis.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Planning, Searching)
                | (Searching, Analyzing)
                | (Analyzing, GapAnalysis)
                | (Analyzing, ReportGeneration)
                | (GapAnalysis, DeepSearching)
                | (GapAnalysis, ReportGeneration)
                | (DeepSearching, Synthesizing)
                | (Synthesizing, ReportGeneration)
                | (ReportGeneration, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == PipelineState::Done
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Increment-on-completion step counter.
///
/// `total` starts at the number of plan steps and grows by one for each
/// extra phase (gap analysis, synthesis) when that phase starts, so
/// `completed <= total` holds at every point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepAccounting {
    pub completed: usize,
    pub total: usize,
}

impl StepAccounting {
    pub fn planned(steps: usize) -> Self {
        Self {
            completed: 0,
            total: steps,
        }
    }

    pub fn add_phase(&mut self) {
        self.total += 1;
    }

    pub fn complete_one(&mut self) {
        self.completed = (self.completed + 1).min(self.total);
    }

    pub fn is_finished(&self) -> bool {
        self.completed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_path_transitions() {
        use PipelineState::*;
        let path = [Planning, Searching, Analyzing, ReportGeneration, Done];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(Done.is_terminal());
    }

    #[test]
    fn test_advanced_path_transitions() {
        use PipelineState::*;
        let path = [
            Planning,
            Searching,
            Analyzing,
            GapAnalysis,
            DeepSearching,
            Synthesizing,
            ReportGeneration,
            Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]));
        }
    }

    #[test]
    fn test_illegal_transitions() {
        use PipelineState::*;
        assert!(!Searching.can_transition_to(Synthesizing));
        assert!(!Analyzing.can_transition_to(DeepSearching));
        assert!(!Done.can_transition_to(Planning));
    }

    #[test]
    fn test_accounting_never_overshoots() {
        let mut steps = StepAccounting::planned(2);
        steps.complete_one();
        steps.complete_one();
        steps.complete_one();
        assert_eq!(steps.completed, 2);
        assert!(steps.is_finished());

        steps.add_phase();
        assert!(!steps.is_finished());
        steps.complete_one();
        assert_eq!((steps.completed, steps.total), (3, 3));
    }
}
