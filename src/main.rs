//! Kodegen Bundler Pipeline - plans platform package builds.
//!
//! This binary loads a project description and prints the command plan,
//! the component build order, or publishes build metadata.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match kodegen_bundler_pipeline::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {suggestion}");
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
