//! `pack`: build every requested artifact.

use super::resolve_config;
use crate::bundler::{Bundler, Source, utils::fs::remove_dir_all};
use crate::cli::{ConfigArgs, RuntimeConfig};
use crate::config::Config;
use crate::error::{CliError, Result};
use tokio::process::Command;

/// Runs the pack pipeline.
///
/// Order: resolve configuration, clear output directories, pre-pack
/// command, binary existence check, parallel packaging.
///
/// # Returns
///
/// 0 when every unit succeeded, otherwise the first failing step's code.
pub async fn pack(args: &ConfigArgs) -> Result<i32> {
    let runtime = RuntimeConfig::from(args);
    let config = resolve_config(args, &runtime)?;

    if config.pack.clear_dir {
        clear_output_dirs(&config, args.source, &runtime).await?;
    }

    if let Some(command) = &config.pack.pre_pack_command {
        let code = run_pre_pack(command, &config, &runtime).await?;
        if code != 0 {
            runtime.error(&format!("Pre-pack command failed with exit code {code}"))?;
            return Ok(code);
        }
    }

    let missing = missing_binaries(&config);
    if !missing.is_empty() {
        runtime.error("Some binaries are missing:")?;
        for (id, path) in &missing {
            runtime.indent(&format!("{id}: {path}"))?;
        }
        return Ok(1);
    }

    runtime.section("Packaging")?;
    let summary = Bundler::new(config).bundle(args.source).await;

    let failed: Vec<_> = summary.failed().collect();
    if failed.is_empty() {
        runtime.success(&format!(
            "Packed {} artifact group(s)",
            summary.outcomes.len()
        ))?;
    } else {
        runtime.error(&format!(
            "{} of {} packaging unit(s) failed:",
            failed.len(),
            summary.outcomes.len()
        ))?;
        for outcome in failed {
            runtime.indent(&format!("{} (exit code {})", outcome.unit, outcome.exit_code))?;
        }
    }

    Ok(summary.exit_code())
}

/// Removes the output subdirectory of every selected family.
async fn clear_output_dirs(config: &Config, source: Source, runtime: &RuntimeConfig) -> Result<()> {
    for family in source.families() {
        let dir = config.output_dir(family);
        runtime.verbose_println(&format!("Clearing {}", dir.display()))?;
        remove_dir_all(&dir).await?;
    }
    Ok(())
}

/// Runs `pack.prePackCommand` in a shell from the configuration directory.
async fn run_pre_pack(command: &str, config: &Config, runtime: &RuntimeConfig) -> Result<i32> {
    runtime.progress(&format!("Running pre-pack command: {command}"))?;

    let mut shell = if cfg!(windows) {
        let mut shell = Command::new("cmd");
        shell.arg("/C");
        shell
    } else {
        let mut shell = Command::new("sh");
        shell.arg("-c");
        shell
    };
    shell.arg(command).current_dir(&config.base_dir);

    let status = shell
        .status()
        .await
        .map_err(|e| CliError::ExecutionFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    Ok(status.code().unwrap_or(1))
}

/// Configured binaries that do not exist on disk, as `(id, path)`.
fn missing_binaries(config: &Config) -> Vec<(String, String)> {
    config
        .binaries
        .keys()
        .filter_map(|id| {
            let path = config.binary_path(id)?;
            (!path.is_file()).then(|| (id.clone(), path.display().to_string()))
        })
        .collect()
}
