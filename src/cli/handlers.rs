//! Subcommand handlers
//!
//! Each handler returns the process exit code: 0 on success, 1 on failure.

use super::commands::{ConfigArgs, ResearchArgs, SearchArgs};
use super::output::OutputFormatter;
use crate::config::DelveConfig;
use crate::llm::select_text_generation;
use crate::pipeline::{PipelineConfig, ResearchPipeline, ResearchRun};
use crate::progress::ProgressStream;
use crate::research::Depth;
use crate::search::{
    HttpImageProbe, MultiSearch, MultiSearchRequest, QueryCompletion, QueryStatus, SearchDepth,
    TavilySearch, Topic,
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

pub async fn handle_research(args: &ResearchArgs, quiet: bool) -> i32 {
    match run_research(args, quiet).await {
        Ok(()) => 0,
        Err(e) => {
            error!("Research failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub async fn handle_search(args: &SearchArgs) -> i32 {
    match run_search(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("Search failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = DelveConfig::default();
    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_config(&config) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Environment configuration with command-line overrides applied
fn research_config(args: &ResearchArgs) -> DelveConfig {
    let mut config = DelveConfig::default();
    if let Some(provider) = args.backend {
        config.provider = provider;
    }
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    if let Some(deadline) = args.deadline {
        config.run_deadline_secs = deadline;
    }
    config
}

fn pipeline_config(args: &ResearchArgs, config: &DelveConfig) -> PipelineConfig {
    PipelineConfig::new()
        .with_depth(args.depth.into())
        .with_profile(args.profile.into())
        .with_include_domains(args.include_domains.clone())
        .with_exclude_domains(args.exclude_domains.clone())
        .with_report(!args.no_report)
        .with_search_timeout(config.search_timeout())
}

async fn run_research(args: &ResearchArgs, quiet: bool) -> Result<()> {
    let config = research_config(args);
    config.validate().context("Invalid configuration")?;
    debug!("Effective configuration: {:?}", config.to_display_map());

    let selected = select_text_generation(&config)?;
    let search = TavilySearch::from_config(&config).context("Web search is not configured")?;

    let pipeline = ResearchPipeline::new(
        selected.client,
        Arc::new(search),
        pipeline_config(args, &config),
    );

    if !quiet {
        info!(
            "Researching \"{}\" with {} ({} depth)",
            args.topic,
            selected.description,
            Depth::from(args.depth)
        );
    }

    let mut run = pipeline.spawn(args.topic.clone());
    let events = run
        .take_events()
        .context("Research run has no event stream")?;
    let forwarder = tokio::spawn(forward_events(events, args.events));
    let interrupt = cancel_on_interrupt(&run);

    let result = run.wait(Some(config.run_deadline())).await;
    interrupt.abort();
    if let Err(e) = forwarder.await {
        warn!("Event forwarder stopped abnormally: {}", e);
    }

    let outcome = result.context("Research run did not complete")?;
    let formatter = OutputFormatter::new(args.format.into());
    let output = formatter.format_outcome(&outcome)?;
    write_output(&output, args.output.as_deref())
}

/// Drains the run's events; with `print` each one goes to stdout as an
/// envelope JSON line.
async fn forward_events(mut events: ProgressStream, print: bool) {
    while let Some(event) = events.next().await {
        if !print {
            continue;
        }
        match serde_json::to_string(&event.envelope()) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize progress event: {}", e),
        }
    }
}

fn cancel_on_interrupt(run: &ResearchRun) -> tokio::task::JoinHandle<()> {
    let token = run.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling research run");
            token.cancel();
        }
    })
}

fn search_request(args: &SearchArgs) -> MultiSearchRequest {
    MultiSearchRequest {
        max_results: args.max_results.clone(),
        topics: args.topics.iter().copied().map(Topic::from).collect(),
        search_depth: args.depths.iter().copied().map(SearchDepth::from).collect(),
        exclude_domains: args.exclude_domains.clone(),
        ..MultiSearchRequest::new(args.queries.clone())
    }
}

async fn run_search(args: &SearchArgs) -> Result<()> {
    let config = DelveConfig::default();
    let search = TavilySearch::from_config(&config).context("Web search is not configured")?;
    let multi = MultiSearch::new(
        Arc::new(search),
        Arc::new(HttpImageProbe::new()),
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<QueryCompletion>();
    let notices = tokio::spawn(async move {
        while let Some(notice) = rx.recv().await {
            match notice.status {
                QueryStatus::Completed => info!(
                    "[{}/{}] \"{}\": {} results, {} images",
                    notice.index + 1,
                    notice.total,
                    notice.query,
                    notice.results_count,
                    notice.images_count
                ),
                QueryStatus::Failed => warn!(
                    "[{}/{}] \"{}\" failed",
                    notice.index + 1,
                    notice.total,
                    notice.query
                ),
            }
        }
    });

    let results = multi.run(&search_request(args), Some(&tx)).await;
    drop(tx);
    let _ = notices.await;

    let formatter = OutputFormatter::new(args.format.into());
    let output = formatter.format_search(&results)?;
    write_output(&output, args.output.as_deref())?;

    if results.iter().all(|r| r.error.is_some()) {
        anyhow::bail!("All {} queries failed", results.len());
    }
    Ok(())
}

fn write_output(output: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}
