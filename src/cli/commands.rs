use crate::config::parse_provider;
use crate::research::{Depth, ResearchProfile};
use crate::search::{SearchDepth, Topic};
use clap::{Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

/// Multi-stage deep research over web search and a language model
#[derive(Parser, Debug)]
#[command(
    name = "delve",
    about = "Multi-stage deep research over web search and a language model",
    version,
    author,
    long_about = "delve plans a set of searches for a topic, runs them, analyzes the results \
                  with an LLM and writes a report. Advanced depth adds a gap analysis, a second \
                  search pass and a synthesis. Supported AI backends: Ollama, OpenAI, Claude, \
                  Gemini, Grok, Groq."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Research a topic",
        long_about = "Plans searches for the topic, runs them, analyzes the results and writes \
                      a report.\n\n\
                      Examples:\n  \
                      delve research \"rust async runtimes\"\n  \
                      delve research \"LCP regressions\" --profile trace --depth advanced\n  \
                      delve research \"quic adoption\" --events --format json -o out.json"
    )]
    Research(ResearchArgs),

    #[command(
        about = "Run several web searches concurrently",
        long_about = "Searches every query at once and prints the de-duplicated results.\n\n\
                      Examples:\n  \
                      delve search \"tokio\" \"async-std\"\n  \
                      delve search \"rust release\" --topic news --max-results 5"
    )]
    Search(SearchArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ResearchArgs {
    #[arg(value_name = "TOPIC", help = "Topic to research")]
    pub topic: String,

    #[arg(long, value_enum, default_value = "basic", help = "Research depth")]
    pub depth: DepthArg,

    #[arg(long, value_enum, default_value = "general", help = "Research profile")]
    pub profile: ProfileArg,

    #[arg(
        long = "include-domain",
        value_name = "DOMAIN",
        help = "Only search these domains (repeatable)"
    )]
    pub include_domains: Vec<String>,

    #[arg(
        long = "exclude-domain",
        value_name = "DOMAIN",
        help = "Never search these domains (repeatable)"
    )]
    pub exclude_domains: Vec<String>,

    #[arg(long, help = "Skip the final report")]
    pub no_report: bool,

    #[arg(long, help = "Print progress events as JSON lines while running")]
    pub events: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'b',
        long,
        value_parser = parse_backend,
        help = "AI backend provider (defaults to DELVE_PROVIDER or ollama)"
    )]
    pub backend: Option<AdapterKind>,

    #[arg(
        short = 'm',
        long,
        value_name = "MODEL",
        help = "Model name to use (provider-specific)"
    )]
    pub model: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Per request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "SECONDS", help = "Deadline for the whole run in seconds")]
    pub deadline: Option<u64>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "QUERY", required = true, help = "Search queries")]
    pub queries: Vec<String>,

    #[arg(
        long = "max-results",
        value_name = "N",
        help = "Results per query; give once for all or once per query"
    )]
    pub max_results: Vec<usize>,

    #[arg(long = "topic", value_enum, help = "Topic per query")]
    pub topics: Vec<TopicArg>,

    #[arg(long = "depth", value_enum, help = "Search depth per query")]
    pub depths: Vec<DepthArg>,

    #[arg(
        long = "exclude-domain",
        value_name = "DOMAIN",
        help = "Never return results from these domains (repeatable)"
    )]
    pub exclude_domains: Vec<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthArg {
    Basic,
    Advanced,
}

impl From<DepthArg> for Depth {
    fn from(arg: DepthArg) -> Self {
        match arg {
            DepthArg::Basic => Depth::Basic,
            DepthArg::Advanced => Depth::Advanced,
        }
    }
}

impl From<DepthArg> for SearchDepth {
    fn from(arg: DepthArg) -> Self {
        Depth::from(arg).into()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileArg {
    General,
    Trace,
}

impl From<ProfileArg> for ResearchProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::General => ResearchProfile::General,
            ProfileArg::Trace => ResearchProfile::Trace,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicArg {
    General,
    News,
}

impl From<TopicArg> for Topic {
    fn from(arg: TopicArg) -> Self {
        match arg {
            TopicArg::General => Topic::General,
            TopicArg::News => Topic::News,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_backend(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).map_err(|e| e.to_string())
}
