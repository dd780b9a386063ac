use modsync::cli::commands::CliArgs;
use modsync::cli::handlers::handle_sync;
use modsync::util::logging;
use modsync::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("modsync v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = handle_sync(&args);

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        logging::parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("MODSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        logging::parse_level(&level_str)
    };

    logging::init(level);
}
