//! GitHub release archives.
//!
//! Each `github.archives.formats` entry produces one archive. A shorthand
//! entry (`linux-x64: tar.gz`) packs the binary registered under the same id
//! plus `archives.extraFiles`; a descriptor packs exactly its `files`.
//!
//! `github.files` are copied unarchived next to the archives.

use crate::bundler::{
    Result,
    archive::create_archive,
    error::Context,
    utils::{
        fs,
        glob::{self, MatchedFile},
    },
};
use crate::config::{ArchiveSpec, Config, FileGlob, GithubConfig};
use std::path::PathBuf;

fn github(config: &Config) -> Result<&GithubConfig> {
    config
        .github
        .as_ref()
        .context("GitHub configuration is missing")
}

fn archive_spec<'a>(github: &'a GithubConfig, archive_id: &str) -> Result<&'a ArchiveSpec> {
    github
        .archives
        .formats
        .get(archive_id)
        .with_context(|| format!("No archive format configured for \"{archive_id}\""))
}

/// `{prefix}{id}.{format}` for shorthand entries, `{id}.{format}` for
/// descriptors.
pub fn archive_name(github: &GithubConfig, archive_id: &str) -> Result<String> {
    Ok(match archive_spec(github, archive_id)? {
        ArchiveSpec::Format(format) => format!(
            "{}{archive_id}.{format}",
            github.archives.prefix.as_deref().unwrap_or_default()
        ),
        ArchiveSpec::Descriptor(descriptor) => format!("{archive_id}.{}", descriptor.format),
    })
}

/// Files packed into `archive_id`, in archive order.
pub fn archive_files(config: &Config, archive_id: &str) -> Result<Vec<MatchedFile>> {
    let github = github(config)?;

    let specs: Vec<FileGlob> = match archive_spec(github, archive_id)? {
        ArchiveSpec::Format(_) => {
            let binary = config.binaries.get(archive_id).with_context(|| {
                format!(
                    "No binary found for archive \"{archive_id}\". Please ensure \"binaries\" includes a mapping for it."
                )
            })?;
            let binary_path = config.resolve_path(binary);
            if !binary_path.is_file() {
                crate::bail!(
                    "Binary for archive \"{}\" does not exist: {}",
                    archive_id,
                    binary_path.display()
                );
            }

            std::iter::once(glob::single_file(&binary_path)?)
                .chain(github.archives.extra_files.iter().cloned())
                .collect()
        }
        ArchiveSpec::Descriptor(descriptor) => descriptor.files.clone(),
    };

    glob::expand_all(&specs, &config.base_dir)
}

/// Builds the archive for `archive_id` into `{pack.dir}/github` and returns
/// its path.
pub fn bundle_archive(config: &Config, archive_id: &str) -> Result<PathBuf> {
    let github = github(config)?;
    let format = archive_spec(github, archive_id)?.format();
    let name = archive_name(github, archive_id)?;
    let files = archive_files(config, archive_id)?;
    if files.is_empty() {
        log::warn!("Archive {name} matched no files");
    }

    let out_dir = fs::create_dir_all(&config.output_dir("github"))?;
    let archive_path = out_dir.join(name);

    let mut archive = create_archive(format, &archive_path)?;
    for file in &files {
        let bytes = fs::read_file(&file.source, "reading archive input")?;
        archive.add_file_with_mode(&bytes, &file.relative, file.mode)?;
    }
    archive.finalize()?;

    Ok(archive_path)
}

/// Copies `github.files` into `{pack.dir}/github`, preserving their paths
/// relative to each glob's `cwd`.
pub fn copy_release_files(config: &Config) -> Result<Vec<PathBuf>> {
    let github = github(config)?;
    let out_dir = config.output_dir("github");

    let mut copied = Vec::new();
    for file in glob::expand_all(&github.files, &config.base_dir)? {
        let target = out_dir.join(&file.relative);
        fs::copy_file(&file.source, &target)?;
        copied.push(target);
    }

    Ok(copied)
}
