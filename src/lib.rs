//! Binary distribution packager library
//!
//! This library turns a set of prebuilt platform binaries and one YAML
//! configuration into:
//! - npm tarballs (a launcher package plus one package per platform)
//! - PyPI wheels (one per platform tag)
//! - GitHub release archives (.tar.gz / .zip)
//!
//! and uploads the results. It can be used both as a CLI tool and as a
//! library dependency.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod publish;

// Re-export commonly used types
pub use config::{Config, ConfigError, ConfigResolver};
pub use error::{BinUploadError, CliError, Result};
