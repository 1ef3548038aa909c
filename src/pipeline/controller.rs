//! Research run controller
//!
//! Sequences planning, searching, analysis, the advanced-depth gap branch
//! and report writing, owns step accounting, and turns every state
//! transition into progress events. Stage failures are local unless noted;
//! only a failed plan ends the run early.

use super::config::PipelineConfig;
use super::outcome::{AnalysisOutcome, ResearchOutcome};
use super::state::{PipelineState, StepAccounting};
use crate::llm::TextGeneration;
use crate::progress::{
    cards, LoggingHandler, ProgressEmitter, ProgressEvent, ProgressHandler, ProgressStream,
};
use crate::research::{
    all_results, expand, merged_results, second_pass_queries, AnalysisEngine, AnalysisResult,
    Depth, GapAnalyzer, PlanGenerator, ReportWriter, ResearchError, SearchExecutor,
    SearchStepOutput, StepKind, Synthesizer,
};
use crate::search::WebSearch;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct ResearchPipeline {
    generator: Arc<dyn TextGeneration>,
    search: Arc<dyn WebSearch>,
    config: PipelineConfig,
    handlers: Vec<Arc<dyn ProgressHandler>>,
}

impl ResearchPipeline {
    pub fn new(
        generator: Arc<dyn TextGeneration>,
        search: Arc<dyn WebSearch>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator,
            search,
            config,
            handlers: vec![Arc::new(LoggingHandler)],
        }
    }

    /// Adds an observer that sees every event before the consumer does
    pub fn with_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Starts a run on the runtime and hands back its event stream.
    pub fn spawn(&self, topic: impl Into<String>) -> ResearchRun {
        let topic = topic.into();
        let (emitter, events) = self.emitter();
        let cancel = CancellationToken::new();

        let pipeline = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { pipeline.run(&topic, &emitter, &token).await });

        ResearchRun {
            events: Some(events),
            cancel,
            handle,
        }
    }

    /// A progress channel wired to this pipeline's handlers
    pub fn emitter(&self) -> (ProgressEmitter, ProgressStream) {
        let (emitter, events) = ProgressEmitter::channel();
        let emitter = self
            .handlers
            .iter()
            .cloned()
            .fold(emitter, ProgressEmitter::with_handler);
        (emitter, events)
    }

    /// Runs to completion on the current task.
    ///
    /// Returns `Cancelled` without emitting anything further once `cancel`
    /// fires or the event consumer goes away.
    pub async fn run(
        &self,
        topic: &str,
        emitter: &ProgressEmitter,
        cancel: &CancellationToken,
    ) -> Result<ResearchOutcome, ResearchError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "research",
            run_id = %run_id,
            depth = %self.config.depth,
            profile = %self.config.profile
        );
        self.execute(run_id, topic, emitter, cancel)
            .instrument(span)
            .await
    }

    async fn execute(
        &self,
        run_id: String,
        topic: &str,
        emitter: &ProgressEmitter,
        cancel: &CancellationToken,
    ) -> Result<ResearchOutcome, ResearchError> {
        let config = &self.config;
        let include_domains = config.effective_include_domains();
        let mut run = RunContext::new(emitter, cancel);

        info!(topic, "Starting research run");

        run.emit(cards::plan_started())?;
        let planner = PlanGenerator::new(self.generator.clone(), config.profile);
        let plan = match run
            .guard(planner.generate(topic, config.depth, &include_domains))
            .await?
        {
            Ok(plan) => plan,
            Err(e) => {
                error!(error = %e, "Research plan generation failed");
                let message = e.to_string();
                run.emit(cards::plan_failed(&message))?;
                run.emit(cards::run_failed(&message, 0, 0))?;
                return Err(e);
            }
        };

        let steps = expand(&plan);
        run.steps = StepAccounting::planned(steps.step_count());
        run.emit(cards::plan_ready(&plan, run.steps.total))?;

        run.transition(PipelineState::Searching)?;
        let executor = SearchExecutor::new(self.search.clone(), config.depth)
            .with_include_domains(include_domains)
            .with_exclude_domains(config.exclude_domains.clone())
            .with_timeout(config.search_timeout);

        let mut results: Vec<SearchStepOutput> = Vec::new();
        for step in &steps.search_steps {
            run.emit(cards::search_started(&step.id, step.kind, &step.query))?;
            let output = match run.guard(executor.execute(step)).await? {
                Ok(output) => output,
                Err(e) => {
                    warn!(error = %e, "Search step failed; continuing with no results");
                    SearchStepOutput::failed(&step.id, step.kind, &step.query, e.to_string())
                }
            };
            run.steps.complete_one();
            run.emit(cards::search_finished(&output))?;
            results.push(output);
        }

        run.transition(PipelineState::Analyzing)?;
        let engine = AnalysisEngine::new(self.generator.clone());
        let mut analyses = Vec::with_capacity(steps.analysis_steps.len());
        for step in &steps.analysis_steps {
            run.emit(cards::analysis_started(step))?;
            let merged = merged_results(&results);
            let (result, failure) = match run.guard(engine.analyze(step, &merged)).await? {
                Ok(result) => (result, None),
                Err(e) => {
                    warn!(error = %e, "Analysis failed; continuing with an empty result");
                    (AnalysisResult::default(), Some(e.to_string()))
                }
            };
            run.steps.complete_one();
            run.emit(cards::analysis_finished(step, &result, failure.as_deref()))?;
            analyses.push(AnalysisOutcome {
                step_id: step.id.clone(),
                analysis_type: step.analysis.analysis_type.clone(),
                result,
                error: failure,
            });
        }

        let mut gap_analysis = None;
        let mut additional_queries = Vec::new();
        let mut synthesis = None;

        if config.depth == Depth::Advanced {
            run.transition(PipelineState::GapAnalysis)?;
            run.steps.add_phase();
            run.emit(cards::gap_analysis_started())?;

            let analyzer = GapAnalyzer::new(self.generator.clone(), config.profile);
            let gathered = all_results(&results);
            match run
                .guard(analyzer.analyze(&gathered, &plan.required_analyses))
                .await?
            {
                Ok(gaps) => {
                    run.steps.complete_one();
                    run.emit(cards::gap_analysis_finished(
                        &gaps,
                        run.steps.completed,
                        run.steps.total,
                    ))?;
                    gap_analysis = Some(gaps);
                }
                Err(e) => {
                    warn!(error = %e, "Gap analysis failed; skipping the second pass");
                    run.steps.complete_one();
                    run.emit(cards::gap_analysis_failed(
                        &e.to_string(),
                        run.steps.completed,
                        run.steps.total,
                    ))?;
                }
            }

            if let Some(gaps) = gap_analysis
                .as_ref()
                .filter(|g| !g.knowledge_gaps.is_empty())
            {
                run.transition(PipelineState::DeepSearching)?;
                additional_queries = second_pass_queries(gaps);
                info!(queries = additional_queries.len(), "Starting second research pass");

                for (n, query) in additional_queries.iter().enumerate() {
                    let id = format!("gap-search-{}", n);
                    run.emit(cards::gap_search_started(&id, query))?;
                    let output = match run.guard(executor.execute_gap(&id, query)).await? {
                        Ok(output) => output,
                        Err(e) => {
                            warn!(error = %e, "Gap search failed; continuing with no results");
                            SearchStepOutput::failed(&id, StepKind::Web, query, e.to_string())
                        }
                    };
                    run.emit(cards::gap_search_finished(&output))?;
                    results.push(output);
                }

                run.transition(PipelineState::Synthesizing)?;
                run.steps.add_phase();
                run.emit(cards::synthesis_started())?;

                let synthesizer = Synthesizer::new(self.generator.clone());
                let gathered = all_results(&results);
                match run
                    .guard(synthesizer.synthesize(&gathered, gaps, &additional_queries))
                    .await?
                {
                    Ok(done) => {
                        run.steps.complete_one();
                        run.emit(cards::synthesis_finished(
                            &done,
                            run.steps.completed,
                            run.steps.total,
                        ))?;
                        synthesis = Some(done);
                    }
                    Err(e) => {
                        warn!(error = %e, "Synthesis failed; the report goes without it");
                        run.steps.complete_one();
                        run.emit(cards::synthesis_failed(
                            &e.to_string(),
                            run.steps.completed,
                            run.steps.total,
                        ))?;
                    }
                }
            }
        }

        run.transition(PipelineState::ReportGeneration)?;
        let report = if config.generate_report {
            let writer = ReportWriter::new(self.generator.clone());
            match run
                .guard(writer.write(topic, &plan, &results, synthesis.as_ref()))
                .await?
            {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(error = %e, "Report generation failed");
                    None
                }
            }
        } else {
            None
        };

        run.transition(PipelineState::Done)?;
        info!(
            completed = run.steps.completed,
            total = run.steps.total,
            "Research run complete"
        );

        Ok(ResearchOutcome {
            run_id,
            topic: topic.to_string(),
            depth: config.depth,
            profile: config.profile,
            plan,
            results,
            analyses,
            gap_analysis,
            additional_queries,
            synthesis,
            report,
            completed_steps: run.steps.completed,
            total_steps: run.steps.total,
        })
    }
}

impl std::fmt::Debug for ResearchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchPipeline")
            .field("generator", &self.generator.name())
            .field("search", &self.search.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Per-run mutable state: the current phase, the step counter and the
/// cancellation plumbing.
struct RunContext<'a> {
    emitter: &'a ProgressEmitter,
    cancel: &'a CancellationToken,
    state: PipelineState,
    steps: StepAccounting,
}

impl<'a> RunContext<'a> {
    fn new(emitter: &'a ProgressEmitter, cancel: &'a CancellationToken) -> Self {
        Self {
            emitter,
            cancel,
            state: PipelineState::Planning,
            steps: StepAccounting::default(),
        }
    }

    fn ensure_live(&self) -> Result<(), ResearchError> {
        if self.cancel.is_cancelled() || self.emitter.is_closed() {
            return Err(ResearchError::Cancelled);
        }
        Ok(())
    }

    fn emit(&self, event: ProgressEvent) -> Result<(), ResearchError> {
        self.ensure_live()?;
        self.emitter.emit(event)?;
        Ok(())
    }

    /// Awaits `fut` unless the run is cancelled first
    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, ResearchError> {
        self.ensure_live()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResearchError::Cancelled),
            output = fut => Ok(output),
        }
    }

    fn transition(&mut self, next: PipelineState) -> Result<(), ResearchError> {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, "Research phase");
        self.state = next;

        let event = if next.is_terminal() {
            cards::run_finished(self.steps.completed, self.steps.total)
        } else {
            cards::run_progress(next.as_str(), self.steps.completed, self.steps.total)
        };
        self.emit(event)
    }
}

/// Handle to a spawned run.
///
/// Dropping the event stream counts as consumer cancellation, so callers
/// that do not take it must keep the handle alive until [`wait`] returns.
///
/// [`wait`]: ResearchRun::wait
pub struct ResearchRun {
    events: Option<ProgressStream>,
    cancel: CancellationToken,
    handle: JoinHandle<Result<ResearchOutcome, ResearchError>>,
}

impl ResearchRun {
    pub fn take_events(&mut self) -> Option<ProgressStream> {
        self.events.take()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the run, cancelling it when `deadline` elapses first
    pub async fn wait(self, deadline: Option<Duration>) -> Result<ResearchOutcome, ResearchError> {
        let ResearchRun {
            events,
            cancel,
            mut handle,
        } = self;
        let _events = events;

        let Some(limit) = deadline else {
            return joined(handle.await);
        };

        match tokio::time::timeout(limit, &mut handle).await {
            Ok(result) => joined(result),
            Err(_) => {
                warn!(seconds = limit.as_secs(), "Research run deadline exceeded");
                cancel.cancel();
                let _ = handle.await;
                Err(ResearchError::DeadlineExceeded {
                    seconds: limit.as_secs(),
                })
            }
        }
    }
}

fn joined(
    result: Result<Result<ResearchOutcome, ResearchError>, JoinError>,
) -> Result<ResearchOutcome, ResearchError> {
    result.map_err(|e| ResearchError::Aborted(e.to_string()))?
}
