//! Configuration resolution errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, substituting, merging or validating the
/// configuration. Every variant is fatal: no packaging starts after one.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Empty configuration path
    #[error("Invalid configuration file path.")]
    EmptyPath,

    /// Configuration path without a YAML extension
    #[error("Configuration file must be a YAML file with .yaml or .yml extension: {}", .0.display())]
    NotYaml(PathBuf),

    /// Configuration file does not exist
    #[error("Configuration file not found at path: {}", .0.display())]
    NotFound(PathBuf),

    /// Configuration file could not be read
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// `${NAME}` placeholder without a matching environment variable
    #[error("Error processing config, '{}': Environment variable {name} is not defined.", path.display())]
    MissingEnvVar {
        /// Path of the configuration file
        path: PathBuf,
        /// Variable name
        name: String,
    },

    /// Malformed YAML
    #[error("Failed to parse configuration '{}': {source}", path.display())]
    Parse {
        /// Path of the configuration file
        path: PathBuf,
        /// YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// Malformed `--set` override
    #[error("Invalid --set value: {value}. {reason}")]
    InvalidOverride {
        /// The raw override
        value: String,
        /// What is wrong with it
        reason: String,
    },

    /// Structural validation failure
    #[error("Config validation error: \"{field}\" {reason}")]
    Validation {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
