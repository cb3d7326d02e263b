//! HiveMind - agents taking turns in a shared meeting log.

use clap::Parser;
use std::process::ExitCode;

use hivemind::{logging, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // The guard flushes the file writer on drop, keep it for the whole run
    let _guard = match logging::init() {
        Ok((guard, _log_dir)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Parse command line arguments
    let args = Commands::parse();

    // Run the command
    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
