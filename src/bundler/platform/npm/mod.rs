//! npm tarballs.
//!
//! The main package carries only a launcher; each configured binary package
//! carries one platform binary and is listed in the main package's
//! `optionalDependencies`, so npm installs just the one matching the host.
//!
//! Every entry lives under `package/`, as `npm pack` lays it out.

mod templates;

use crate::bundler::{
    Result,
    archive::{ArchiveWriter, EXECUTABLE_FILE_MODE, create_archive},
    error::Context,
    utils::{fs, template},
};
use crate::config::{ArchiveFormat, Config, NpmConfig};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// `{name}` for the main package, `{name}-{platform}` for a binary package.
pub fn package_name(npm: &NpmConfig, platform_id: Option<&str>) -> String {
    match platform_id {
        Some(id) => format!("{}-{id}", npm.package_json.name),
        None => npm.package_json.name.clone(),
    }
}

/// `{sanitized}[-{platform}]-{version}.tgz`, where `@` is dropped and `/`
/// becomes `-`.
pub fn tarball_name(npm: &NpmConfig, platform_id: Option<&str>) -> String {
    let sanitized = npm.package_json.name.replace('@', "").replace('/', "-");
    let version = &npm.package_json.version;
    match platform_id {
        Some(id) => format!("{sanitized}-{id}-{version}.tgz"),
        None => format!("{sanitized}-{version}.tgz"),
    }
}

/// Synthesizes `package.json`.
///
/// `name` and `version` come first, then the template's other keys in order,
/// then the generated fields. Generated fields overwrite template keys of the
/// same name in place.
pub fn package_json(npm: &NpmConfig, platform_id: Option<&str>) -> Result<String> {
    let mut pkg = Map::new();
    pkg.insert("name".into(), json!(package_name(npm, platform_id)));
    pkg.insert("version".into(), json!(npm.package_json.version));
    for (key, value) in &npm.package_json.fields {
        pkg.insert(key.clone(), value.clone());
    }

    pkg.insert("type".into(), json!("module"));
    pkg.insert(
        "exports".into(),
        json!({
            ".": { "import": "./index.js" },
            "./package.json": "./package.json",
        }),
    );

    let mut files = vec!["package.json".to_string(), "index.js".to_string()];
    for extra in [&npm.readme_file, &npm.license_file].into_iter().flatten() {
        files.push(fs::file_name(extra)?);
    }

    match platform_id {
        None => {
            files_entry(&mut pkg, files);
            pkg.insert("bin".into(), bin_field(&npm.bin_names));
            let optional: Map<String, Value> = npm
                .binary_packages
                .keys()
                .map(|id| {
                    (
                        package_name(npm, Some(id)),
                        json!(npm.package_json.version),
                    )
                })
                .collect();
            pkg.insert("optionalDependencies".into(), Value::Object(optional));
        }
        Some(id) => {
            let info = npm.binary_packages.get(id).with_context(|| {
                format!(
                    "No binary package info found for \"{id}\". Please ensure \"npm.binaryPackages\" includes a mapping for it."
                )
            })?;
            pkg.insert("os".into(), json!([info.os]));
            pkg.insert("cpu".into(), json!([info.arch]));
            files.push("bin".to_string());
            files_entry(&mut pkg, files);
        }
    }

    Ok(serde_json::to_string_pretty(&Value::Object(pkg))?)
}

fn files_entry(pkg: &mut Map<String, Value>, files: Vec<String>) {
    pkg.insert("files".into(), json!(files));
}

/// `"index.js"`, or `{name: "index.js"}` for every configured bin name.
fn bin_field(bin_names: &[String]) -> Value {
    if bin_names.is_empty() {
        return json!("index.js");
    }
    let bins: Map<String, Value> = bin_names
        .iter()
        .map(|name| (name.clone(), json!("index.js")))
        .collect();
    Value::Object(bins)
}

#[derive(Serialize)]
struct LauncherPackage {
    key: String,
    name: String,
}

/// Main package launcher, keyed by `{os}-{arch}`.
pub fn main_index_js(npm: &NpmConfig) -> Result<String> {
    let packages: Vec<_> = npm
        .binary_packages
        .iter()
        .map(|(id, info)| LauncherPackage {
            key: info.platform_key(),
            name: package_name(npm, Some(id)),
        })
        .collect();

    template::render(templates::MAIN_INDEX_JS, &json!({ "packages": packages }))
}

/// Binary package entry point exposing `getBinPath()`.
pub fn bin_index_js(bin_filename: &str) -> Result<String> {
    let mut data = BTreeMap::new();
    data.insert("bin_filename", bin_filename);
    template::render(templates::BIN_INDEX_JS, &data)
}

/// Builds one tarball into `{pack.dir}/npm` and returns its path.
///
/// `platform_id` selects a binary package; `None` builds the main package.
pub fn bundle_package(config: &Config, platform_id: Option<&str>) -> Result<PathBuf> {
    let npm = config
        .npm
        .as_ref()
        .context("npm configuration is missing")?;

    // Everything that can fail on configuration is computed before the
    // tarball is created.
    let manifest = package_json(npm, platform_id)?;
    let (index_js, binary) = match platform_id {
        None => (main_index_js(npm)?, None),
        Some(id) => {
            let path = config.binary_path(id).with_context(|| {
                format!(
                    "No binary path found for \"{id}\". Please ensure \"binaries\" includes a mapping for it."
                )
            })?;
            let name = fs::file_name(&path)?;
            let bytes = fs::read_file(&path, "reading binary")?;
            (bin_index_js(&name)?, Some((name, bytes)))
        }
    };

    let mut extras = Vec::new();
    for file in [&npm.readme_file, &npm.license_file].into_iter().flatten() {
        let path = config.resolve_path(file);
        extras.push((fs::file_name(&path)?, fs::read_file(&path, "reading package file")?));
    }

    let out_dir = fs::create_dir_all(&config.output_dir("npm"))?;
    let tarball = out_dir.join(tarball_name(npm, platform_id));

    let mut archive = create_archive(ArchiveFormat::TarGz, &tarball)?;
    write_entries(archive.as_mut(), &manifest, &index_js, &extras, binary.as_ref())?;
    archive.finalize()?;

    Ok(tarball)
}

fn write_entries(
    archive: &mut dyn ArchiveWriter,
    manifest: &str,
    index_js: &str,
    extras: &[(String, Vec<u8>)],
    binary: Option<&(String, Vec<u8>)>,
) -> Result<()> {
    archive.add_file(manifest.as_bytes(), "package/package.json")?;
    archive.add_file(index_js.as_bytes(), "package/index.js")?;
    for (name, bytes) in extras {
        archive.add_file(bytes, &format!("package/{name}"))?;
    }
    if let Some((name, bytes)) = binary {
        archive.add_file_with_mode(bytes, &format!("package/bin/{name}"), EXECUTABLE_FILE_MODE)?;
    }
    Ok(())
}
