//! Format-agnostic archive writing.
//!
//! [`create_archive`] opens a tar.gz or zip writer behind the
//! [`ArchiveWriter`] trait. Every added entry reports an [`ArchiveEntry`]
//! whose hash and size describe the exact bytes written, which is what the
//! wheel RECORD is assembled from.
//!
//! Entries carry a fixed modification time so the archive bytes depend only
//! on the entry contents, paths and modes.

mod tar;
mod zip;

pub use self::tar::TarGzWriter;
pub use self::zip::ZipWriter;

use crate::bundler::{Result, checksum::content_hash};
use crate::config::ArchiveFormat;
use std::path::Path;

/// Mode given to entries added without an explicit one.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode for bundled executables.
pub const EXECUTABLE_FILE_MODE: u32 = 0o755;

/// One file written into an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// `/`-separated path inside the archive.
    pub path: String,
    /// Base64url SHA-256 of the written bytes.
    pub hash: String,
    /// Byte length of the written bytes.
    pub size: u64,
}

impl ArchiveEntry {
    pub fn new(path: &str, contents: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            hash: content_hash(contents),
            size: contents.len() as u64,
        }
    }

    /// `path,sha256=hash,size` row of a wheel RECORD.
    pub fn record_line(&self) -> String {
        format!("{},sha256={},{}", self.path, self.hash, self.size)
    }
}

/// Writer over one archive file.
///
/// Calls against one writer are sequential; entry order is the call order.
pub trait ArchiveWriter: Send {
    /// Adds `contents` at `archive_path` with Unix permission bits `mode`.
    fn add_file_with_mode(
        &mut self,
        contents: &[u8],
        archive_path: &str,
        mode: u32,
    ) -> Result<ArchiveEntry>;

    /// Adds a regular, non-executable file.
    fn add_file(&mut self, contents: &[u8], archive_path: &str) -> Result<ArchiveEntry> {
        self.add_file_with_mode(contents, archive_path, DEFAULT_FILE_MODE)
    }

    /// Writes trailing structures, flushes and syncs the file. All bytes are
    /// on disk once this returns.
    fn finalize(self: Box<Self>) -> Result<()>;
}

/// Creates the archive file at `path`, creating parent directories.
pub fn create_archive(format: ArchiveFormat, path: &Path) -> Result<Box<dyn ArchiveWriter>> {
    log::debug!("Creating {} archive at {}", format, path.display());
    Ok(match format {
        ArchiveFormat::TarGz => Box::new(TarGzWriter::create(path)?),
        ArchiveFormat::Zip => Box::new(ZipWriter::create(path)?),
    })
}

fn create_parent(path: &Path) -> Result<()> {
    use crate::bundler::error::ErrorExt;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).fs_context("creating archive directory", parent)?;
    }
    Ok(())
}
