//! Command line interface for bin-upload.
//!
//! `pack` builds artifacts, `publish` uploads them. Both resolve the same
//! configuration first.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, ConfigArgs, RuntimeConfig};
pub use output::OutputManager;

use crate::error::{CliError, Result};

/// Main CLI entry point
///
/// # Returns
///
/// The process exit code.
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    match &args.command {
        Command::Pack(common) => commands::pack(common).await,
        Command::Publish(common) => commands::publish(common).await,
    }
}
