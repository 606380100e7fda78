//! Declarative packaging configuration.
//!
//! The configuration is resolved once per invocation by [`ConfigResolver`]:
//!
//! 1. load the YAML file
//! 2. substitute `${NAME}` environment placeholders in the raw text
//! 3. deep-merge `--set key=value` overrides
//! 4. validate the structure, then deserialize into [`Config`]
//!
//! After resolution the value is read-only and shared between packaging
//! units behind an `Arc`.

mod env;
mod error;
mod merge;
mod overrides;
mod validate;

pub use env::{UndefinedVariable, substitute_env_vars};
pub use error::ConfigError;
pub use merge::deep_merge;
pub use overrides::{overrides_to_value, parse_override};
pub use validate::{NODE_ARCHES, NODE_PLATFORMS, validate};

use path_absolutize::Absolutize;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Ordered key/value map used for pass-through sections
/// (`packageJson`, PyPI metadata, publish flags, release options).
pub type PassthroughMap = serde_json::Map<String, serde_json::Value>;

/// Resolved configuration root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Platform id -> prebuilt binary path.
    pub binaries: BTreeMap<String, PathBuf>,

    /// Output settings.
    pub pack: PackConfig,

    /// npm packaging, if enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npm: Option<NpmConfig>,

    /// PyPI packaging, if enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pypi: Option<PypiConfig>,

    /// GitHub release archives, if enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubConfig>,

    /// Directory relative paths are resolved against (the working directory
    /// at resolution time).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// `pack` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackConfig {
    /// Output root for all artifacts.
    pub dir: PathBuf,

    /// Shell command run once before packaging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_pack_command: Option<String>,

    /// Remove previous artifacts before packaging.
    #[serde(default = "default_clear_dir")]
    pub clear_dir: bool,
}

fn default_clear_dir() -> bool {
    true
}

/// Treats an explicit `null` like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `npm` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpmConfig {
    /// package.json template.
    pub package_json: PackageJson,

    /// Platform id -> npm `os`/`cpu` pair for per-platform packages.
    #[serde(default, deserialize_with = "null_as_default")]
    pub binary_packages: BTreeMap<String, BinaryPackage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file: Option<PathBuf>,

    /// CLI entry point names exposed through `bin`.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub bin_names: Vec<String>,

    /// Flags forwarded to `npm publish`.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "PassthroughMap::is_empty"
    )]
    pub publish: PassthroughMap,
}

/// package.json template: required name and version plus any other fields
/// in their configured order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageJson {
    pub name: String,
    pub version: String,
    #[serde(flatten)]
    pub fields: PassthroughMap,
}

/// Node `process.platform` / `process.arch` pair of a per-platform package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryPackage {
    pub os: String,
    pub arch: String,
}

impl BinaryPackage {
    /// Launcher lookup key, matching `${process.platform}-${process.arch}`.
    pub fn platform_key(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

/// `pypi` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PypiConfig {
    /// Core metadata fields.
    pub metadata: PypiMetadata,

    /// Platform id -> wheel platform tag (e.g. `manylinux_2_17_x86_64`).
    pub platform_tags: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file: Option<PathBuf>,

    /// `console_scripts` names; defaults to the distribution name.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub entry_point_names: Vec<String>,

    /// Flags forwarded to `uv publish`.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "PassthroughMap::is_empty"
    )]
    pub publish: PassthroughMap,
}

/// Core metadata: required `Name` and `Version` plus any other fields.
///
/// `fields` holds every configured key in its configured order, `Name` and
/// `Version` included; `name` and `version` are their typed values and win
/// over the map when METADATA is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PassthroughMap", into = "PassthroughMap")]
pub struct PypiMetadata {
    pub name: String,
    pub version: String,
    pub fields: PassthroughMap,
}

impl TryFrom<PassthroughMap> for PypiMetadata {
    type Error = String;

    fn try_from(fields: PassthroughMap) -> Result<Self, Self::Error> {
        let required = |key: &str| {
            fields
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| format!("pypi.metadata.{key} must be a string"))
        };
        Ok(Self {
            name: required("Name")?,
            version: required("Version")?,
            fields,
        })
    }
}

impl From<PypiMetadata> for PassthroughMap {
    fn from(metadata: PypiMetadata) -> Self {
        let mut fields = metadata.fields;
        fields.insert("Name".into(), serde_json::Value::String(metadata.name));
        fields.insert("Version".into(), serde_json::Value::String(metadata.version));
        fields
    }
}

/// `github` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,

    pub archives: ArchivesConfig,

    /// Files copied verbatim next to the archives.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub files: Vec<FileGlob>,

    /// Release options (`tag_name`, `name`, `body`, `draft`, ...).
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "PassthroughMap::is_empty"
    )]
    pub release: PassthroughMap,
}

/// `github.archives` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivesConfig {
    /// Prefix for shorthand archive names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Archive id -> format or descriptor.
    pub formats: BTreeMap<String, ArchiveSpec>,

    /// Files added to every shorthand archive.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub extra_files: Vec<FileGlob>,
}

/// One `github.archives.formats` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArchiveSpec {
    /// Shorthand: archive the binary registered under the same id.
    Format(ArchiveFormat),
    /// Explicit file list.
    Descriptor(ArchiveDescriptor),
}

impl ArchiveSpec {
    pub fn format(&self) -> ArchiveFormat {
        match self {
            Self::Format(format) => *format,
            Self::Descriptor(descriptor) => descriptor.format,
        }
    }
}

/// Explicit archive contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDescriptor {
    pub format: ArchiveFormat,
    pub files: Vec<FileGlob>,
}

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl ArchiveFormat {
    /// File extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArchiveFormat {
    type Err = crate::bundler::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zip" => Ok(Self::Zip),
            "tar.gz" => Ok(Self::TarGz),
            other => Err(crate::bundler::Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A set of files: a bare pattern relative to the working directory, or a
/// pattern anchored at `cwd`. Archive paths are relative to that anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileGlob {
    Pattern(String),
    Scoped { cwd: PathBuf, pattern: String },
}

impl Config {
    /// Resolves a configured path against the base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Absolute output root (`pack.dir`).
    pub fn pack_dir(&self) -> PathBuf {
        let dir = self.resolve_path(&self.pack.dir);
        match dir.absolutize() {
            Ok(absolute) => absolute.into_owned(),
            Err(_) => dir,
        }
    }

    /// Output directory of one artifact family (`npm`, `pypi`, `github`).
    pub fn output_dir(&self, family: &str) -> PathBuf {
        self.pack_dir().join(family)
    }

    /// Path of the binary registered under `binary_id`.
    pub fn binary_path(&self, binary_id: &str) -> Option<PathBuf> {
        self.binaries.get(binary_id).map(|p| self.resolve_path(p))
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Loads, substitutes, merges and validates a configuration file.
pub struct ConfigResolver<E = fn(&str) -> Option<String>> {
    base_dir: PathBuf,
    env: E,
}

impl ConfigResolver {
    /// Resolver rooted at the current working directory, reading the
    /// process environment.
    pub fn from_process() -> Result<Self, ConfigError> {
        let base_dir = std::env::current_dir().map_err(|source| ConfigError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self {
            base_dir,
            env: process_env as fn(&str) -> Option<String>,
        })
    }
}

impl<E> ConfigResolver<E>
where
    E: Fn(&str) -> Option<String>,
{
    /// Resolver with an explicit base directory and environment lookup.
    pub fn with_env(base_dir: impl Into<PathBuf>, env: E) -> Self {
        Self {
            base_dir: base_dir.into(),
            env,
        }
    }

    /// Runs the whole pipeline for `path` with `--set` overrides.
    pub fn resolve(&self, path: &Path, overrides: &[String]) -> Result<Config, ConfigError> {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if !is_yaml {
            return Err(ConfigError::NotYaml(path.to_path_buf()));
        }

        let config_path = self.base_dir.join(path);
        if !config_path.is_file() {
            return Err(ConfigError::NotFound(config_path));
        }

        let raw = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;

        let text = substitute_env_vars(&raw, &self.env).map_err(|UndefinedVariable(name)| {
            ConfigError::MissingEnvVar {
                path: config_path.clone(),
                name,
            }
        })?;

        let mut value: serde_yaml::Value =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: config_path.clone(),
                source,
            })?;

        let override_value = overrides_to_value(overrides)?;
        deep_merge(&mut value, override_value);
        log::debug!("Merged {} override(s) into configuration", overrides.len());

        validate(&value, &self.base_dir)?;

        let mut config: Config =
            serde_yaml::from_value(value).map_err(|source| ConfigError::Parse {
                path: config_path,
                source,
            })?;
        config.base_dir = self.base_dir.clone();

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const BASIC: &str = r#"
binaries:
  linux-x64: "./bin/linux-x64/demo"
pack:
  dir: "./dist"
npm:
  packageJson:
    name: "@scope/demo"
    version: "${VERSION}"
    description: "Demo tool"
  binaryPackages:
    linux-x64:
      os: linux
      arch: x64
"#;

    fn resolver(
        dir: &Path,
        vars: &[(&str, &str)],
    ) -> ConfigResolver<impl Fn(&str) -> Option<String>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigResolver::with_env(dir, move |name: &str| vars.get(name).cloned())
    }

    #[test]
    fn resolves_env_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.yaml"), BASIC).unwrap();

        let config = resolver(dir.path(), &[("VERSION", "1.2.3")])
            .resolve(
                Path::new("demo.yaml"),
                &["npm.packageJson.description=Overridden".to_string()],
            )
            .unwrap();

        let npm = config.npm.as_ref().unwrap();
        assert_eq!(npm.package_json.name, "@scope/demo");
        assert_eq!(npm.package_json.version, "1.2.3");
        assert_eq!(
            npm.package_json.fields.get("description"),
            Some(&serde_json::json!("Overridden"))
        );
        assert_eq!(config.base_dir, dir.path());
        assert!(config.pack.clear_dir);
    }

    #[test]
    fn rejects_non_yaml_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.json"), "{}").unwrap();

        let err = resolver(dir.path(), &[])
            .resolve(Path::new("demo.json"), &[])
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotYaml(_)));
    }

    #[test]
    fn rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver(dir.path(), &[])
            .resolve(Path::new("missing.yml"), &[])
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn undefined_variable_fails_resolution() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.yaml"), BASIC).unwrap();

        let err = resolver(dir.path(), &[])
            .resolve(Path::new("demo.yaml"), &[])
            .unwrap_err();
        match err {
            ConfigError::MissingEnvVar { name, .. } => assert_eq!(name, "VERSION"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn override_is_validated_after_merge() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.yaml"), BASIC).unwrap();

        let err = resolver(dir.path(), &[("VERSION", "1.0.0")])
            .resolve(Path::new("demo.yaml"), &["npm.packageJson.name=".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation { ref field, .. } if field == "npm.packageJson.name"
        ));
    }

    #[test]
    fn null_overrides_clear_optional_lists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.yaml"), BASIC).unwrap();

        let config = resolver(dir.path(), &[("VERSION", "1.0.0")])
            .resolve(
                Path::new("demo.yaml"),
                &[
                    "npm.binaryPackages=null".to_string(),
                    "npm.publish=null".to_string(),
                    "npm.binNames=null".to_string(),
                ],
            )
            .unwrap();

        let npm = config.npm.as_ref().unwrap();
        assert!(npm.binary_packages.is_empty());
        assert!(npm.publish.is_empty());
        assert!(npm.bin_names.is_empty());
    }

    #[test]
    fn archive_format_parsing() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("tar.gz".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarGz);
        assert!("rar".parse::<ArchiveFormat>().is_err());
    }

    #[test]
    fn archive_specs_deserialize_both_forms() {
        let yaml = r#"
linux-x64: "tar.gz"
source:
  format: zip
  files:
    - "README.md"
    - cwd: src
      pattern: "**/*"
"#;
        let formats: BTreeMap<String, ArchiveSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(formats["linux-x64"], ArchiveSpec::Format(ArchiveFormat::TarGz));
        assert_eq!(
            formats["source"],
            ArchiveSpec::Descriptor(ArchiveDescriptor {
                format: ArchiveFormat::Zip,
                files: vec![
                    FileGlob::Pattern("README.md".into()),
                    FileGlob::Scoped {
                        cwd: "src".into(),
                        pattern: "**/*".into()
                    },
                ],
            })
        );
    }
}
