//! Shared helpers for the packagers.

pub mod fs;
pub mod glob;
pub mod template;
