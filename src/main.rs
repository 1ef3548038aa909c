use delve::cli::commands::{CliArgs, Commands};
use delve::cli::handlers::{handle_config, handle_research, handle_search};
use delve::util::logging;
use delve::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("delve v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Research(research_args) => handle_research(research_args, args.quiet).await,
        Commands::Search(search_args) => handle_search(search_args).await,
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    if let Some(level) = &args.log_level {
        logging::with_level(level);
    } else if args.verbose {
        logging::with_level("debug");
    } else if args.quiet {
        logging::with_level("error");
    } else {
        logging::init_from_env();
    }
}
