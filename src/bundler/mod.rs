//! Artifact assembly.
//!
//! - [`archive`] - tar.gz and zip writers reporting per-entry hashes
//! - [`platform`] - npm, PyPI and GitHub packagers
//! - [`builder`] - unit planning and the parallel runner

pub mod archive;
pub mod builder;
pub mod checksum;
pub mod error;
pub mod platform;
pub mod utils;

pub use builder::{BundledArtifact, Bundler, RunSummary, Source, Unit};
pub use error::{Error, Result};
