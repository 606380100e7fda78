//! File system utilities for packaging.
//!
//! Blocking helpers are used from packaging units, which run on blocking
//! threads; the async ones are used by the commands before units start.

use crate::bundler::{
    Result,
    error::{Error, ErrorExt},
};
use std::{
    io,
    path::{Path, PathBuf},
};

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(Error::Fs {
            context: "removing directory",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Creates all of the directories of the specified path.
pub fn create_dir_all(path: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(path).fs_context("creating output directory", path)?;
    Ok(path.to_path_buf())
}

/// Reads a whole input file; the error names what the file was for.
pub fn read_file(path: &Path, context: &'static str) -> Result<Vec<u8>> {
    std::fs::read(path).fs_context(context, path)
}

/// Final path component as a string, e.g. the binary name stored in a
/// package.
pub fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::GenericError(format!("{} has no file name", path.display())))
}

/// Unix permission bits of `path`, or the default file mode elsewhere.
pub fn file_mode(path: &Path) -> Result<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path).fs_context("reading file metadata", path)?;
        Ok(metadata.permissions().mode() & 0o777)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(crate::bundler::archive::DEFAULT_FILE_MODE)
    }
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        std::fs::create_dir_all(dest_dir).fs_context("creating directory", dest_dir)?;
    }
    std::fs::copy(from, to).fs_context("copying file", from)?;
    Ok(())
}
