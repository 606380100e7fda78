//! File glob expansion.
//!
//! A [`FileGlob`] expands to the regular files under its `cwd` (default: the
//! configuration base directory) matching its pattern. Matching is recursive
//! with `**`, includes dotfiles and skips directories. The stored path is the
//! match relative to `cwd`, `/`-separated.

use crate::bundler::{Result, error::Error, utils::fs::file_mode};
use crate::config::FileGlob;
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One matched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// Path on disk.
    pub source: PathBuf,
    /// Path relative to the glob's `cwd`, `/`-separated.
    pub relative: String,
    /// Unix permission bits of the source.
    pub mode: u32,
}

/// Glob selecting exactly `file`, anchored at its parent directory.
pub fn single_file(file: &Path) -> Result<FileGlob> {
    let name = crate::bundler::utils::fs::file_name(file)?;
    let cwd = file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(FileGlob::Scoped {
        cwd,
        pattern: Pattern::escape(&name),
    })
}

/// Expands one file glob, sorted by relative path.
pub fn expand(spec: &FileGlob, base_dir: &Path) -> Result<Vec<MatchedFile>> {
    let (cwd, pattern) = match spec {
        FileGlob::Pattern(pattern) => (base_dir.to_path_buf(), pattern.as_str()),
        FileGlob::Scoped { cwd, pattern } => (base_dir.join(cwd), pattern.as_str()),
    };
    let pattern = pattern.trim_start_matches("./");
    let full = format!(
        "{}/{}",
        Pattern::escape(&cwd.to_string_lossy()).trim_end_matches('/'),
        pattern
    );

    let mut matches = Vec::new();
    for entry in glob::glob_with(&full, MATCH_OPTIONS)? {
        let source = entry?;
        if !source.is_file() {
            continue;
        }
        let relative = relative_path(&source, &cwd)?;
        let mode = file_mode(&source)?;
        matches.push(MatchedFile {
            source,
            relative,
            mode,
        });
    }
    matches.sort_by(|a, b| a.relative.cmp(&b.relative));

    log::debug!("{} matched {} file(s)", full, matches.len());
    Ok(matches)
}

/// Expands every glob in order. When two globs yield the
/// same relative path the first one is kept.
pub fn expand_all(specs: &[FileGlob], base_dir: &Path) -> Result<Vec<MatchedFile>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for spec in specs {
        for file in expand(spec, base_dir)? {
            if seen.insert(file.relative.clone()) {
                files.push(file);
            } else {
                log::warn!(
                    "Skipping {}: {} is already included",
                    file.source.display(),
                    file.relative
                );
            }
        }
    }

    Ok(files)
}

fn relative_path(path: &Path, cwd: &Path) -> Result<String> {
    let stripped = path.strip_prefix(cwd).map_err(|_| {
        Error::GenericError(format!(
            "{} is not inside {}",
            path.display(),
            cwd.display()
        ))
    })?;

    let parts: Vec<_> = stripped
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("docs/guide")).unwrap();
        std::fs::write(root.join("README.md"), b"readme").unwrap();
        std::fs::write(root.join(".env.example"), b"A=1").unwrap();
        std::fs::write(root.join("docs/intro.md"), b"intro").unwrap();
        std::fs::write(root.join("docs/guide/setup.md"), b"setup").unwrap();
        std::fs::write(root.join("docs/.hidden"), b"h").unwrap();
        dir
    }

    fn relatives(files: &[MatchedFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative.as_str()).collect()
    }

    #[test]
    fn bare_pattern_is_relative_to_base() {
        let dir = tree();
        let files = expand(&FileGlob::Pattern("*.md".into()), dir.path()).unwrap();
        assert_eq!(relatives(&files), ["README.md"]);
    }

    #[test]
    fn scoped_pattern_is_recursive_and_includes_dotfiles() {
        let dir = tree();
        let spec = FileGlob::Scoped {
            cwd: "docs".into(),
            pattern: "**/*".into(),
        };
        let files = expand(&spec, dir.path()).unwrap();
        assert_eq!(relatives(&files), [".hidden", "guide/setup.md", "intro.md"]);
    }

    #[test]
    fn directories_are_skipped() {
        let dir = tree();
        let files = expand(&FileGlob::Pattern("docs/*".into()), dir.path()).unwrap();
        assert_eq!(relatives(&files), ["docs/.hidden", "docs/intro.md"]);
    }

    #[test]
    fn no_match_is_empty() {
        let dir = tree();
        assert!(expand(&FileGlob::Pattern("*.exe".into()), dir.path())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn duplicates_keep_first() {
        let dir = tree();
        let specs = [
            FileGlob::Pattern("README.md".into()),
            FileGlob::Scoped {
                cwd: ".".into(),
                pattern: "README.md".into(),
            },
        ];
        let files = expand_all(&specs, dir.path()).unwrap();
        assert_eq!(relatives(&files), ["README.md"]);
    }

    #[test]
    fn single_file_escapes_name() {
        let dir = tree();
        std::fs::write(dir.path().join("docs/tool[1]"), b"bin").unwrap();
        let spec = single_file(Path::new("docs/tool[1]")).unwrap();
        let files = expand(&spec, dir.path()).unwrap();
        assert_eq!(relatives(&files), ["tool[1]"]);
    }
}
