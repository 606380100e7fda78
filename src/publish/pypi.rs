//! `uv publish` adapter.

use super::{flags_to_args, require_artifact, run_inherited};
use crate::bundler::{builder::tool_detection::UV, platform::pypi::wheel_name};
use crate::config::Config;
use anyhow::Context as _;
use std::path::PathBuf;
use tokio::process::Command;

/// Wheels produced for the configured platform tags.
pub fn wheels(config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let pypi = config.pypi.as_ref().context("PyPI configuration is missing")?;
    let out_dir = config.output_dir("pypi");

    pypi.platform_tags
        .keys()
        .map(|id| -> anyhow::Result<PathBuf> { Ok(out_dir.join(wheel_name(pypi, id)?)) })
        .collect()
}

/// Uploads all wheels with one `uv publish` call over `{pack.dir}/pypi/*.whl`.
pub async fn publish(config: &Config) -> anyhow::Result<i32> {
    let pypi = config.pypi.as_ref().context("PyPI configuration is missing")?;
    for wheel in wheels(config)? {
        require_artifact(&wheel)?;
    }

    let program = UV
        .clone()
        .context("uv was not found in PATH; it is required to publish PyPI packages")?;
    let pattern = config.output_dir("pypi").join("*.whl");
    let args = flags_to_args(&pypi.publish);
    log::info!("Publishing PyPI packages {}...", pattern.display());

    let mut command = Command::new(program);
    command.arg("publish").args(&args).arg(&pattern);
    let code = run_inherited(command, "uv publish").await?;

    if code == 0 {
        log::info!("Finished publishing PyPI packages.");
        Ok(0)
    } else {
        log::error!("uv publish failed (exit code {code})");
        Ok(1)
    }
}
