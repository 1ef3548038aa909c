//! Research run orchestration

pub mod config;
mod controller;
mod outcome;
pub mod state;

pub use config::PipelineConfig;
pub use controller::{ResearchPipeline, ResearchRun};
pub use outcome::{AnalysisOutcome, ResearchOutcome};
pub use state::{PipelineState, StepAccounting};
