//! delve - multi-stage deep research over web search and a language model
//!
//! A research run plans a set of web and academic searches for a topic,
//! executes them, analyzes the accumulated results with an LLM and writes a
//! report. At advanced depth it also reviews the results for limitations and
//! knowledge gaps, runs a second search pass for the gaps and synthesizes the
//! findings before the report.
//!
//! # Core Concepts
//!
//! - **Text generation**: Pluggable LLM providers behind [`TextGeneration`],
//!   with schema-constrained structured answers and streamed text
//! - **Web search**: The [`WebSearch`] seam, backed by Tavily or a mock
//! - **Progress events**: Every state transition is reported as a
//!   [`ProgressEvent`] card on a stream the caller consumes
//!
//! # Example Usage
//!
//! ```ignore
//! use delve::{PipelineConfig, ResearchPipeline};
//! use delve::research::Depth;
//! use tokio_stream::StreamExt;
//!
//! async fn research(
//!     generator: std::sync::Arc<dyn delve::TextGeneration>,
//!     search: std::sync::Arc<dyn delve::WebSearch>,
//! ) -> Result<(), delve::ResearchError> {
//!     let pipeline = ResearchPipeline::new(
//!         generator,
//!         search,
//!         PipelineConfig::new().with_depth(Depth::Advanced),
//!     );
//!     let mut run = pipeline.spawn("HTTP/3 adoption");
//!     let mut events = run.take_events().unwrap();
//!     tokio::spawn(async move {
//!         while let Some(event) = events.next().await {
//!             println!("{}: {}", event.title, event.message);
//!         }
//!     });
//!
//!     let outcome = run.wait(None).await?;
//!     println!("{}", outcome.report.unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`llm`]: Text generation clients and structured output validation
//! - [`search`]: Web search clients, de-duplication and multi-query search
//! - [`research`]: Plan, search, analysis, gap, synthesis and report stages
//! - [`progress`]: Progress events, the emitter and observers
//! - [`pipeline`]: The run controller and its state machine
//! - [`cli`]: The `delve` command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod research;
pub mod search;
pub mod util;

pub use config::{ConfigError, DelveConfig};
pub use llm::{GenAITextGeneration, GenerationError, MockTextGeneration, TextGeneration};
pub use pipeline::{PipelineConfig, ResearchOutcome, ResearchPipeline, ResearchRun};
pub use progress::{ProgressEmitter, ProgressEvent, ProgressHandler, ResearchUpdate};
pub use research::{Depth, ResearchError, ResearchPlan, ResearchProfile};
pub use search::{MockWebSearch, SearchError, TavilySearch, WebSearch};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
