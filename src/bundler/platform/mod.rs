//! Registry-specific packagers.
//!
//! Each packager turns the resolved configuration plus one unit id into one
//! artifact under its own output subdirectory (`npm/`, `pypi/`, `github/`).

pub mod github;
pub mod npm;
pub mod pypi;
