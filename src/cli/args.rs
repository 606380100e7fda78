//! Command line argument parsing and validation.

use crate::bundler::Source;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Package prebuilt binaries for npm, PyPI and GitHub releases
#[derive(Parser, Debug)]
#[command(
    name = "bin-upload",
    version,
    about = "Package prebuilt binaries for npm, PyPI and GitHub releases",
    long_about = "Packs prebuilt platform binaries into npm tarballs, PyPI wheels and GitHub release archives from one YAML configuration, then publishes them.

Usage:
  bin-upload pack
  bin-upload pack --config ./bin-upload.config.yaml
  bin-upload pack -s npm.packageJson.version=1.0.0 -s pypi.metadata.Version=1.0.0
  bin-upload publish --source npm

Exit code 0 = every requested artifact was built (or uploaded)."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Pack binaries into publishable artifacts
    Pack(ConfigArgs),
    /// Publish packed artifacts to npm, PyPI or GitHub
    Publish(ConfigArgs),
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the YAML configuration file
    #[arg(
        short = 'c',
        long,
        value_name = "PATH",
        default_value = "bin-upload.config.yaml"
    )]
    pub config: PathBuf,

    /// Set a configuration value, e.g. --set npm.packageJson.version=1.0.0
    ///
    /// Keys use dot notation; `\.` and `\=` are literal. May be repeated;
    /// later values win.
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Artifact families to process
    #[arg(long, value_enum, default_value_t = Source::All)]
    pub source: Source,

    /// Print the resolved configuration and debug logs
    #[arg(long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Options of the selected subcommand.
    pub fn config_args(&self) -> &ConfigArgs {
        match &self.command {
            Command::Pack(args) | Command::Publish(args) => args,
        }
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        let args = self.config_args();
        if args.config.as_os_str().is_empty() {
            return Err("Config path cannot be empty".to_string());
        }
        if let Some(empty) = args.set.iter().find(|s| s.trim().is_empty()) {
            return Err(format!("Invalid --set value: {empty:?}. Expected format is key=value."));
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&ConfigArgs> for RuntimeConfig {
    fn from(args: &ConfigArgs) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.output.error(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
