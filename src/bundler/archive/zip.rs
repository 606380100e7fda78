//! zip archives (wheels, `.zip` release archives).

use super::{ArchiveEntry, ArchiveWriter, create_parent};
use crate::bundler::{Result, error::ErrorExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::{CompressionMethod, DateTime, write::SimpleFileOptions};

pub struct ZipWriter {
    zip: zip::ZipWriter<BufWriter<File>>,
    path: PathBuf,
}

impl ZipWriter {
    pub fn create(path: &Path) -> Result<Self> {
        create_parent(path)?;
        let file = File::create(path).fs_context("creating archive", path)?;

        Ok(Self {
            zip: zip::ZipWriter::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }
}

impl ArchiveWriter for ZipWriter {
    fn add_file_with_mode(
        &mut self,
        contents: &[u8],
        archive_path: &str,
        mode: u32,
    ) -> Result<ArchiveEntry> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(mode)
            .last_modified_time(DateTime::default());

        self.zip.start_file(archive_path, options)?;
        self.zip
            .write_all(contents)
            .fs_context("writing zip entry", &self.path)?;

        Ok(ArchiveEntry::new(archive_path, contents))
    }

    fn finalize(self: Box<Self>) -> Result<()> {
        let Self { zip, path } = *self;
        let writer = zip.finish()?;
        let file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .fs_context("flushing archive", &path)?;
        file.sync_all().fs_context("syncing archive", &path)?;
        Ok(())
    }
}
