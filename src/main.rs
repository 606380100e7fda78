//! bin-upload - package prebuilt binaries for npm, PyPI and GitHub releases.
//!
//! This binary resolves the YAML configuration, builds every requested
//! artifact in parallel and exits non-zero if any unit failed.

use std::process;

use bin_upload::cli::{self, Args};

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    // Initialize logging; RUST_LOG still wins
    let default_filter = if args.config_args().verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Run CLI and get exit code
    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
