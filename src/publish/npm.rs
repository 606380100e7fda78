//! `npm publish` adapter.

use super::{flags_to_args, require_artifact, run_inherited};
use crate::bundler::{builder::tool_detection::NPM, platform::npm::tarball_name};
use crate::config::Config;
use anyhow::Context as _;
use std::path::PathBuf;
use tokio::process::Command;

/// Tarballs to publish: platform packages first, so the main package's
/// optional dependencies exist by the time it is published.
pub fn tarballs(config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let npm = config.npm.as_ref().context("npm configuration is missing")?;
    let out_dir = config.output_dir("npm");

    Ok(npm
        .binary_packages
        .keys()
        .map(|id| out_dir.join(tarball_name(npm, Some(id))))
        .chain(std::iter::once(out_dir.join(tarball_name(npm, None))))
        .collect())
}

/// Publishes every tarball. Returns 0 if all uploads succeeded.
pub async fn publish(config: &Config) -> anyhow::Result<i32> {
    let npm = config.npm.as_ref().context("npm configuration is missing")?;
    let tarballs = tarballs(config)?;
    for tarball in &tarballs {
        require_artifact(tarball)?;
    }

    let program = NPM
        .clone()
        .context("npm was not found in PATH; it is required to publish npm packages")?;
    let args = flags_to_args(&npm.publish);
    log::info!("npm publish arguments: {}", args.join(" "));

    let mut exit_code = 0;
    for tarball in tarballs {
        log::info!("Publishing npm package {}...", tarball.display());

        let mut command = Command::new(&program);
        command.arg("publish").args(&args).arg(&tarball);
        let code = run_inherited(command, "npm publish").await?;

        if code == 0 {
            log::info!("Finished publishing npm package {}.", tarball.display());
        } else {
            log::error!("npm publish failed for {} (exit code {code})", tarball.display());
            exit_code = 1;
        }
    }

    Ok(exit_code)
}
