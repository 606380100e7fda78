//! `publish`: upload artifacts produced by `pack`.

use super::resolve_config;
use crate::bundler::Source;
use crate::cli::{ConfigArgs, RuntimeConfig};
use crate::error::Result;
use crate::publish as publishers;

/// Uploads every selected, configured family.
///
/// A failing family does not stop the others. Returns 1 if any failed.
pub async fn publish(args: &ConfigArgs) -> Result<i32> {
    let runtime = RuntimeConfig::from(args);
    let config = resolve_config(args, &runtime)?;
    let source = args.source;
    let mut exit_code = 0;

    if source.includes(Source::Npm) {
        if config.npm.is_some() {
            runtime.section("Publishing npm packages")?;
            exit_code |= report(&runtime, "npm", publishers::npm::publish(&config).await)?;
        } else {
            runtime.warn("npm configuration is missing. Skipping npm publish.")?;
        }
    }

    if source.includes(Source::Pypi) {
        if config.pypi.is_some() {
            runtime.section("Publishing PyPI wheels")?;
            exit_code |= report(&runtime, "PyPI", publishers::pypi::publish(&config).await)?;
        } else {
            runtime.warn("PyPI configuration is missing. Skipping PyPI publish.")?;
        }
    }

    if source.includes(Source::Github) {
        if config.github.is_some() {
            runtime.section("Publishing GitHub release")?;
            exit_code |= report(&runtime, "GitHub", publishers::github::publish(&config).await)?;
        } else {
            runtime.warn("GitHub configuration is missing. Skipping GitHub publish.")?;
        }
    }

    Ok(exit_code)
}

/// Prints the outcome of one family and maps it to 0 or 1.
fn report(runtime: &RuntimeConfig, family: &str, result: anyhow::Result<i32>) -> Result<i32> {
    match result {
        Ok(0) => {
            runtime.success(&format!("Published {family} artifacts"))?;
            Ok(0)
        }
        Ok(code) => {
            runtime.error(&format!("{family} publish failed (exit code {code})"))?;
            Ok(1)
        }
        Err(e) => {
            runtime.error(&format!("{family} publish failed: {e:#}"))?;
            Ok(1)
        }
    }
}
