//! Upload adapters.
//!
//! Each adapter uploads artifacts that `pack` already produced and reports an
//! exit code: 0 when every upload succeeded, 1 otherwise.
//!
//! - [`npm`] - `npm publish` per tarball, main package last
//! - [`pypi`] - `uv publish` over the wheel directory
//! - [`github`] - REST client creating the release and uploading assets

pub mod args;
pub mod github;
pub mod npm;
pub mod pypi;

pub use args::flags_to_args;

use anyhow::Context as _;
use std::path::Path;
use tokio::process::Command;

/// Runs `command` with inherited stdio and returns its exit code.
pub(crate) async fn run_inherited(mut command: Command, what: &str) -> anyhow::Result<i32> {
    log::debug!("Running {what}: {command:?}");
    let status = command
        .status()
        .await
        .with_context(|| format!("failed to spawn {what}"))?;
    Ok(status.code().unwrap_or(1))
}

/// Fails with a hint to run `pack` when an expected artifact is missing.
pub(crate) fn require_artifact(path: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(
        path.is_file(),
        "{} does not exist. Run `bin-upload pack` first.",
        path.display()
    );
    Ok(())
}
