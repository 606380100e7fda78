//! tar + gzip archives (npm tarballs, `.tar.gz` release archives).

use super::{ArchiveEntry, ArchiveWriter, create_parent};
use crate::bundler::{Result, error::ErrorExt};
use flate2::{Compression, write::GzEncoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Fixed entry mtime (1985-10-26T08:15:00Z), as used by npm for packed
/// tarballs.
const ENTRY_MTIME: u64 = 499_162_500;

pub struct TarGzWriter {
    builder: tar::Builder<GzEncoder<BufWriter<File>>>,
    path: PathBuf,
}

impl TarGzWriter {
    pub fn create(path: &Path) -> Result<Self> {
        create_parent(path)?;
        let file = File::create(path).fs_context("creating archive", path)?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

        Ok(Self {
            builder: tar::Builder::new(encoder),
            path: path.to_path_buf(),
        })
    }
}

impl ArchiveWriter for TarGzWriter {
    fn add_file_with_mode(
        &mut self,
        contents: &[u8],
        archive_path: &str,
        mode: u32,
    ) -> Result<ArchiveEntry> {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(mode);
        header.set_mtime(ENTRY_MTIME);
        header.set_uid(0);
        header.set_gid(0);

        self.builder
            .append_data(&mut header, archive_path, contents)
            .fs_context("writing tar entry", &self.path)?;

        Ok(ArchiveEntry::new(archive_path, contents))
    }

    fn finalize(self: Box<Self>) -> Result<()> {
        let Self { builder, path } = *self;
        let encoder = builder
            .into_inner()
            .fs_context("finishing tar archive", &path)?;
        let writer = encoder.finish().fs_context("finishing gzip stream", &path)?;
        let file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .fs_context("flushing archive", &path)?;
        file.sync_all().fs_context("syncing archive", &path)?;
        Ok(())
    }
}
