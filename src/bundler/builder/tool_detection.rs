//! External tool detection for the publish adapters.
//!
//! Results are cached so each tool is looked up at most once per process.

use std::path::PathBuf;
use std::sync::LazyLock;

/// `npm`, used by `publish --source npm`.
pub static NPM: LazyLock<Option<PathBuf>> = LazyLock::new(|| detect("npm", "--version"));

/// `uv`, used by `publish --source pypi`.
pub static UV: LazyLock<Option<PathBuf>> = LazyLock::new(|| detect("uv", "--version"));

fn detect(tool: &str, version_flag: &str) -> Option<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());

            match std::process::Command::new(&path).arg(version_flag).output() {
                Ok(output) if output.status.success() => {
                    let version = String::from_utf8_lossy(&output.stdout);
                    log::debug!("✓ {} available: {}", tool, version.trim());
                    Some(path)
                }
                Ok(output) => {
                    log::warn!(
                        "{} found at {} but {} check failed (exit code: {:?}). Stderr: {}",
                        tool,
                        path.display(),
                        version_flag,
                        output.status.code(),
                        String::from_utf8_lossy(&output.stderr)
                    );
                    None
                }
                Err(e) => {
                    log::warn!(
                        "{} found at {} but failed to execute: {}. Check file permissions.",
                        tool,
                        path.display(),
                        e
                    );
                    None
                }
            }
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", tool, e);
            None
        }
    }
}
