//! Standalone Bundler - freezes a packaged Python application into a standalone executable.
//!
//! This binary builds one versioned, checksummed single-file executable per
//! run, with proper error handling and recovery hints.

use standalone_bundler::cli::{self, Args, OutputManager};
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    // Initialize logging; --verbose raises the default level, RUST_LOG still wins
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    // Run CLI and get exit code
    let exit_code = match cli::execute(args).await {
        Ok(code) => code,
        Err(e) => {
            let output = OutputManager::new(false, false);
            output.error(&format!("Error: {}", e));
            for suggestion in e.recovery_suggestions() {
                output.error(&format!("  • {}", suggestion));
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
