//! Output formatting for multiple formats
//!
//! Renders research outcomes, multi-search results and the effective
//! configuration as JSON, YAML, or human-readable text.
//!
//! # Example
//!
//! ```ignore
//! use delve::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_outcome(&outcome)?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::config::DelveConfig;
use crate::pipeline::ResearchOutcome;
use crate::search::QuerySearchResult;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";
const BRANCH: &str = "\u{251C}\u{2500}";
const LAST_BRANCH: &str = "\u{2514}\u{2500}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_outcome(&self, outcome: &ResearchOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome)
                .context("Failed to serialize research outcome to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(outcome)
                .context("Failed to serialize research outcome to YAML"),
            OutputFormat::Human => Ok(outcome_human(outcome)),
        }
    }

    pub fn format_search(&self, results: &[QuerySearchResult]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(results)
                .context("Failed to serialize search results to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(results).context("Failed to serialize search results to YAML")
            }
            OutputFormat::Human => Ok(search_human(results)),
        }
    }

    pub fn format_config(&self, config: &DelveConfig) -> Result<String> {
        let map: BTreeMap<String, String> = config.to_display_map().into_iter().collect();
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&map).context("Failed to serialize config to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&map).context("Failed to serialize config to YAML")
            }
            OutputFormat::Human => Ok(config_human(&map)),
        }
    }
}

fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 1.0) * 10.0).round() as usize;
    "\u{2588}".repeat(filled) + &"\u{2591}".repeat(10 - filled)
}

fn connector(index: usize, len: usize) -> &'static str {
    if index + 1 == len {
        LAST_BRANCH
    } else {
        BRANCH
    }
}

fn outcome_human(outcome: &ResearchOutcome) -> String {
    let mut out = String::new();

    let finished = outcome.completed_steps == outcome.total_steps;
    let mark = if finished { "\u{2713}" } else { "\u{26A0}" };
    let _ = writeln!(out, "{} Research: {}", mark, outcome.topic);
    let _ = writeln!(out, "{}\n", RULE);
    let _ = writeln!(out, "Depth:    {}", outcome.depth);
    let _ = writeln!(out, "Profile:  {}", outcome.profile);
    let _ = writeln!(
        out,
        "Steps:    {}/{}\n",
        outcome.completed_steps, outcome.total_steps
    );

    out.push_str("Searches:\n");
    let len = outcome.results.len();
    for (i, search) in outcome.results.iter().enumerate() {
        let status = match &search.error {
            Some(e) => format!("failed: {}", e),
            None => format!("{} results", search.results.len()),
        };
        let _ = writeln!(
            out,
            "{} [{}] \"{}\" ({})",
            connector(i, len),
            search.kind,
            search.query.query,
            status
        );
    }
    out.push('\n');

    for analysis in &outcome.analyses {
        let _ = writeln!(out, "Analysis: {}", analysis.analysis_type);
        if let Some(ref e) = analysis.error {
            let _ = writeln!(out, "  \u{26A0} {}", e);
        }
        for finding in &analysis.result.findings {
            let _ = writeln!(
                out,
                "  {} {:>3}% {}",
                confidence_bar(finding.confidence),
                (finding.confidence * 100.0).round() as i64,
                finding.insight
            );
        }
        out.push('\n');
    }

    if let Some(ref gaps) = outcome.gap_analysis {
        out.push_str("Limitations:\n");
        for limitation in &gaps.limitations {
            let _ = writeln!(
                out,
                "  - {} (severity {})",
                limitation.description, limitation.severity
            );
        }
        out.push_str("Knowledge Gaps:\n");
        for gap in &gaps.knowledge_gaps {
            let _ = writeln!(out, "  - {}: {}", gap.topic, gap.reason);
        }
        out.push('\n');
    }

    if let Some(ref synthesis) = outcome.synthesis {
        out.push_str("Key Findings:\n");
        for finding in &synthesis.key_findings {
            let _ = writeln!(
                out,
                "  {} {}",
                confidence_bar(finding.confidence),
                finding.finding
            );
        }
        if !synthesis.remaining_uncertainties.is_empty() {
            out.push_str("Open Questions:\n");
            for uncertainty in &synthesis.remaining_uncertainties {
                let _ = writeln!(out, "  - {}", uncertainty);
            }
        }
        out.push('\n');
    }

    let sources = outcome.sources();
    let _ = writeln!(out, "Sources ({}):", sources.len());
    for source in &sources {
        let _ = writeln!(out, "  - {} <{}>", source.title, source.url);
    }

    if let Some(ref report) = outcome.report {
        let _ = writeln!(out, "\n{}", RULE);
        out.push_str(report);
        if !report.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}

fn search_human(results: &[QuerySearchResult]) -> String {
    let mut out = String::new();
    for result in results {
        let mark = if result.error.is_some() {
            "\u{2717}"
        } else {
            "\u{2713}"
        };
        let _ = writeln!(out, "{} {}", mark, result.query);
        let _ = writeln!(out, "{}", RULE);
        if let Some(ref e) = result.error {
            let _ = writeln!(out, "  Error: {}", e);
        }
        let len = result.results.len();
        for (i, hit) in result.results.iter().enumerate() {
            let _ = writeln!(out, "{} {}", connector(i, len), hit.title);
            let _ = writeln!(out, "     {}", hit.url);
        }
        if !result.images.is_empty() {
            let _ = writeln!(out, "  Images: {}", result.images.len());
        }
        out.push('\n');
    }
    out
}

fn config_human(map: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str("delve Configuration\n");
    let _ = writeln!(out, "{}\n", RULE);
    for (key, value) in map {
        let _ = writeln!(out, "  {:<22} {}", format!("{}:", key), value);
    }
    out
}
