//! Planning and running packaging units.
//!
//! The [`Bundler`] turns a resolved [`Config`] into a fixed list of
//! [`Unit`]s (one per npm package, wheel, archive, plus the release file
//! copy) and runs them through [`run_units`].

use super::runner::{RunSummary, UnitReporter, run_units};
use crate::bundler::{
    Result,
    checksum::calculate_sha256,
    error::ErrorExt,
    platform::{github, npm, pypi},
};
use crate::config::Config;
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Artifact families selected with `--source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Source {
    #[default]
    All,
    Npm,
    Pypi,
    Github,
}

impl Source {
    pub fn includes(self, family: Source) -> bool {
        self == Source::All || self == family
    }

    /// Output subdirectories of the selected families.
    pub fn families(self) -> Vec<&'static str> {
        [(Source::Npm, "npm"), (Source::Pypi, "pypi"), (Source::Github, "github")]
            .into_iter()
            .filter(|(family, _)| self.includes(*family))
            .map(|(_, name)| name)
            .collect()
    }
}

/// One independently built artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// Main npm package (launcher only).
    NpmMain,
    /// npm package for one binary platform.
    NpmPlatform(String),
    /// Wheel for one platform tag.
    Pypi(String),
    /// One GitHub archive.
    GithubArchive(String),
    /// Copy of `github.files`.
    GithubFiles,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NpmMain => f.write_str("npm"),
            Self::NpmPlatform(id) => write!(f, "npm:{id}"),
            Self::Pypi(id) => write!(f, "pypi:{id}"),
            Self::GithubArchive(id) => write!(f, "github:{id}"),
            Self::GithubFiles => f.write_str("github:files"),
        }
    }
}

/// A file produced by a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledArtifact {
    pub path: PathBuf,
    pub size: u64,
    /// Hex SHA-256.
    pub checksum: String,
}

impl BundledArtifact {
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let size = std::fs::metadata(&path)
            .fs_context("reading artifact metadata", &path)?
            .len();
        let checksum = calculate_sha256(&path)?;
        Ok(Self {
            path,
            size,
            checksum,
        })
    }
}

/// Packaging orchestrator over one resolved configuration.
#[derive(Debug, Clone)]
pub struct Bundler {
    config: Arc<Config>,
}

impl Bundler {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the resolved configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Units for the selected families. Unconfigured families are skipped
    /// with a warning.
    pub fn plan(&self, source: Source) -> Vec<Unit> {
        let config = &self.config;
        let mut units = Vec::new();

        if source.includes(Source::Npm) {
            match &config.npm {
                Some(npm) => {
                    units.extend(npm.binary_packages.keys().cloned().map(Unit::NpmPlatform));
                    units.push(Unit::NpmMain);
                }
                None => log::warn!(
                    "npm configuration is missing in the config file. Skipping npm packages."
                ),
            }
        }

        if source.includes(Source::Pypi) {
            match &config.pypi {
                Some(pypi) => units.extend(pypi.platform_tags.keys().cloned().map(Unit::Pypi)),
                None => log::warn!(
                    "PyPI configuration is missing in the config file. Skipping PyPI packages."
                ),
            }
        }

        if source.includes(Source::Github) {
            match &config.github {
                Some(github) => {
                    units.extend(
                        github
                            .archives
                            .formats
                            .keys()
                            .cloned()
                            .map(Unit::GithubArchive),
                    );
                    if !github.files.is_empty() {
                        units.push(Unit::GithubFiles);
                    }
                }
                None => log::warn!(
                    "GitHub configuration is missing in the config file. Skipping GitHub archives."
                ),
            }
        }

        units
    }

    /// Builds every planned unit concurrently.
    pub async fn bundle(&self, source: Source) -> RunSummary {
        let units = self.plan(source);
        log::debug!("Running {} packaging unit(s)", units.len());

        let config = Arc::clone(&self.config);
        run_units(units, move |unit, reporter| {
            build_unit(&config, &unit, reporter)
        })
        .await
    }
}

/// Builds one unit, reporting progress and every produced artifact.
pub fn build_unit(config: &Config, unit: &Unit, reporter: &UnitReporter) -> Result<()> {
    let description = describe(config, unit);
    reporter.log(format!("Building {description}"));

    let paths = match unit {
        Unit::NpmMain => vec![npm::bundle_package(config, None)?],
        Unit::NpmPlatform(id) => vec![npm::bundle_package(config, Some(id))?],
        Unit::Pypi(id) => vec![pypi::bundle_wheel(config, id)?],
        Unit::GithubArchive(id) => vec![github::bundle_archive(config, id)?],
        Unit::GithubFiles => github::copy_release_files(config)?,
    };

    for path in paths {
        let artifact = BundledArtifact::from_path(path)?;
        reporter.log(format!(
            "Created {} ({} bytes, sha256 {})",
            artifact.path.display(),
            artifact.size,
            artifact.checksum
        ));
    }

    reporter.log(format!("Finished {description}"));
    Ok(())
}

fn describe(config: &Config, unit: &Unit) -> String {
    let named = match unit {
        Unit::NpmMain => config.npm.as_ref().map(|n| npm::package_name(n, None)),
        Unit::NpmPlatform(id) => config.npm.as_ref().map(|n| npm::package_name(n, Some(id))),
        Unit::Pypi(id) => config
            .pypi
            .as_ref()
            .and_then(|p| pypi::wheel_name(p, id).ok()),
        Unit::GithubArchive(id) => config
            .github
            .as_ref()
            .and_then(|g| github::archive_name(g, id).ok()),
        Unit::GithubFiles => Some("release files".to_string()),
    };

    match (unit, named) {
        (Unit::NpmMain | Unit::NpmPlatform(_), Some(name)) => format!("npm package {name}"),
        (Unit::Pypi(_), Some(name)) => format!("PyPI package {name}"),
        (Unit::GithubArchive(_), Some(name)) => format!("GitHub archive {name}"),
        (Unit::GithubFiles, _) => "GitHub release files".to_string(),
        (unit, None) => unit.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigResolver;
    use std::path::Path;

    const CONFIG: &str = r#"
binaries:
  linux-x64: bin/demo
  win-x64: bin/demo.exe
pack:
  dir: dist
npm:
  packageJson:
    name: "@scope/demo"
    version: "1.0.0"
  binaryPackages:
    linux-x64: { os: linux, arch: x64 }
    win-x64: { os: win32, arch: x64 }
pypi:
  metadata:
    Name: demo
    Version: "1.0.0"
  platformTags:
    linux-x64: manylinux_2_17_x86_64
github:
  owner: me
  repo: demo
  token: t
  archives:
    formats:
      linux-x64: tar.gz
      win-x64: zip
  files:
    - install.sh
"#;

    fn bundler(dir: &Path) -> Bundler {
        std::fs::create_dir_all(dir.join("bin")).unwrap();
        std::fs::write(dir.join("bin/demo"), b"\x7fELF").unwrap();
        std::fs::write(dir.join("bin/demo.exe"), b"MZ").unwrap();
        std::fs::write(dir.join("install.sh"), b"#!/bin/sh").unwrap();
        std::fs::write(dir.join("bin-upload.config.yaml"), CONFIG).unwrap();

        let config = ConfigResolver::with_env(dir, |_: &str| -> Option<String> { None })
            .resolve(Path::new("bin-upload.config.yaml"), &[])
            .unwrap();
        Bundler::new(config)
    }

    #[test]
    fn plans_one_unit_per_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = bundler(dir.path());

        let units: Vec<String> = bundler
            .plan(Source::All)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            units,
            [
                "npm:linux-x64",
                "npm:win-x64",
                "npm",
                "pypi:linux-x64",
                "github:linux-x64",
                "github:win-x64",
                "github:files"
            ]
        );

        assert_eq!(bundler.plan(Source::Pypi), [Unit::Pypi("linux-x64".into())]);
    }

    #[test]
    fn source_families() {
        assert_eq!(Source::All.families(), ["npm", "pypi", "github"]);
        assert_eq!(Source::Github.families(), ["github"]);
    }

    #[tokio::test]
    async fn bundles_everything() {
        let dir = tempfile::tempdir().unwrap();
        let summary = bundler(dir.path()).bundle(Source::All).await;

        assert_eq!(summary.exit_code(), 0, "{:?}", summary.messages);
        let dist = dir.path().join("dist");
        for artifact in [
            "npm/scope-demo-1.0.0.tgz",
            "npm/scope-demo-linux-x64-1.0.0.tgz",
            "npm/scope-demo-win-x64-1.0.0.tgz",
            "pypi/demo-1.0.0-py3-none-manylinux_2_17_x86_64.whl",
            "github/linux-x64.tar.gz",
            "github/win-x64.zip",
            "github/install.sh",
        ] {
            assert!(dist.join(artifact).is_file(), "missing {artifact}");
        }
    }

    #[tokio::test]
    async fn failing_unit_keeps_other_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = bundler(dir.path());
        std::fs::remove_file(dir.path().join("bin/demo.exe")).unwrap();

        let summary = bundler.bundle(Source::Github).await;
        assert_eq!(summary.exit_code(), 1);
        let failed: Vec<_> = summary.failed().map(|o| o.unit.as_str()).collect();
        assert_eq!(failed, ["github:win-x64"]);
        assert!(dir.path().join("dist/github/linux-x64.tar.gz").is_file());
    }
}
