//! Unit planning and parallel execution.
//!
//! - [`orchestrator`] - [`Bundler`], the unit list and per-unit dispatch
//! - [`runner`] - isolated concurrent execution and exit code aggregation
//! - [`tool_detection`] - external tool availability for publishing

pub mod orchestrator;
pub mod runner;
pub mod tool_detection;

pub use orchestrator::{BundledArtifact, Bundler, Source, Unit, build_unit};
pub use runner::{MessageKind, RunSummary, UnitMessage, UnitOutcome, UnitReporter, run_units};
