pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, ConfigArgs, ResearchArgs, SearchArgs};
pub use output::{OutputFormat, OutputFormatter};
