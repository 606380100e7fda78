//! Platform wheels.
//!
//! One wheel per `pypi.platformTags` entry, tagged `py3-none-{platform}`.
//! Entries are written in a fixed order and `RECORD` goes last, built from
//! the hash and size the writer reported for every other entry.

mod templates;

use crate::bundler::{
    Result,
    archive::{ArchiveEntry, ArchiveWriter, EXECUTABLE_FILE_MODE, create_archive},
    error::Context,
    utils::{fs, template},
};
use crate::config::{ArchiveFormat, Config, PypiConfig};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// `Generator` line of the WHEEL file.
pub const GENERATOR: &str = concat!("bin-upload ", env!("CARGO_PKG_VERSION"));

/// Distribution name with `-` replaced by `_`, used for the import package,
/// the wheel file name and the dist-info directory.
pub fn normalized_name(pypi: &PypiConfig) -> String {
    pypi.metadata.name.replace('-', "_")
}

/// `py3-none-{platform tag}` for `platform_id`.
pub fn wheel_tag(pypi: &PypiConfig, platform_id: &str) -> Result<String> {
    let tag = pypi.platform_tags.get(platform_id).with_context(|| {
        format!(
            "No platform tag found for \"{platform_id}\". Please ensure \"pypi.platformTags\" includes a mapping for it."
        )
    })?;
    Ok(format!("py3-none-{tag}"))
}

/// `{name}-{version}-{tag}.whl`.
pub fn wheel_name(pypi: &PypiConfig, platform_id: &str) -> Result<String> {
    Ok(format!(
        "{}-{}-{}.whl",
        normalized_name(pypi),
        pypi.metadata.version,
        wheel_tag(pypi, platform_id)?
    ))
}

/// `{name}-{version}.dist-info`.
pub fn dist_info_dir(pypi: &PypiConfig) -> String {
    format!("{}-{}.dist-info", normalized_name(pypi), pypi.metadata.version)
}

/// `entry_points.txt`: one console script per configured name, or the
/// distribution name.
pub fn entry_points(pypi: &PypiConfig) -> String {
    let target = format!("{}.__init__:run", normalized_name(pypi));
    let names: Vec<&str> = if pypi.entry_point_names.is_empty() {
        vec![pypi.metadata.name.as_str()]
    } else {
        pypi.entry_point_names.iter().map(String::as_str).collect()
    };

    std::iter::once("[console_scripts]".to_string())
        .chain(names.into_iter().map(|name| format!("{name} = {target}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Core metadata file.
///
/// Keys are written in their configured order; `Name` and `Version` lead
/// only when the map does not carry them. List values produce one
/// `Key: item` line per item. `readme` is the readme text, appended as a
/// markdown description.
pub fn metadata(pypi: &PypiConfig, license_name: Option<&str>, readme: Option<&str>) -> String {
    let meta = &pypi.metadata;
    let mut lines = vec!["Metadata-Version: 2.5".to_string()];
    for (key, value) in [("Name", &meta.name), ("Version", &meta.version)] {
        if !meta.fields.contains_key(key) {
            lines.push(format!("{key}: {value}"));
        }
    }

    for (key, value) in &meta.fields {
        match (key.as_str(), value) {
            ("Name", _) => lines.push(format!("Name: {}", meta.name)),
            ("Version", _) => lines.push(format!("Version: {}", meta.version)),
            (_, Value::Null) => {}
            (_, Value::Array(items)) => {
                lines.extend(items.iter().map(|item| format!("{key}: {}", scalar(item))));
            }
            (_, other) => lines.push(format!("{key}: {}", scalar(other))),
        }
    }

    if let Some(name) = license_name {
        lines.push(format!("License-File: {name}"));
    }

    if let Some(readme) = readme {
        lines.push("Description-Content-Type: text/markdown".to_string());
        lines.push(String::new());
        lines.push(readme.to_string());
    }

    lines.join("\n")
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// WHEEL file for `tag`.
pub fn wheel_file(tag: &str) -> Result<String> {
    let mut data = BTreeMap::new();
    data.insert("generator", GENERATOR);
    data.insert("tag", tag);
    template::render(templates::WHEEL, &data)
}

/// `__init__.py` launching `bin/{bin_name}`.
pub fn init_py(bin_name: &str) -> Result<String> {
    let mut data = BTreeMap::new();
    data.insert("bin_name", bin_name);
    template::render(templates::INIT_PY, &data)
}

/// RECORD listing every prior entry, then itself with empty hash and size.
pub fn record(dist_info: &str, entries: &[ArchiveEntry]) -> String {
    entries
        .iter()
        .map(ArchiveEntry::record_line)
        .chain(std::iter::once(format!("{dist_info}/RECORD,,")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the wheel for `platform_id` into `{pack.dir}/pypi` and returns its
/// path.
pub fn bundle_wheel(config: &Config, platform_id: &str) -> Result<PathBuf> {
    let pypi = config
        .pypi
        .as_ref()
        .context("PyPI configuration is missing")?;

    let tag = wheel_tag(pypi, platform_id)?;
    let wheel = wheel_name(pypi, platform_id)?;
    let name = normalized_name(pypi);
    let dist_info = dist_info_dir(pypi);

    let binary_path = config.binary_path(platform_id).with_context(|| {
        format!(
            "No binary path found for \"{platform_id}\". Please ensure \"binaries\" includes a mapping for it."
        )
    })?;
    let bin_name = fs::file_name(&binary_path)?;
    let binary = fs::read_file(&binary_path, "reading binary")?;

    let readme = match &pypi.readme_file {
        Some(path) => {
            let bytes = fs::read_file(&config.resolve_path(path), "reading readme")?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => None,
    };
    let license = match &pypi.license_file {
        Some(path) => {
            let path = config.resolve_path(path);
            Some((fs::file_name(&path)?, fs::read_file(&path, "reading license")?))
        }
        None => None,
    };

    let init = init_py(&bin_name)?;
    let metadata = metadata(pypi, license.as_ref().map(|(n, _)| n.as_str()), readme.as_deref());
    let wheel_meta = wheel_file(&tag)?;

    let out_dir = fs::create_dir_all(&config.output_dir("pypi"))?;
    let wheel_path = out_dir.join(&wheel);

    let mut archive = create_archive(ArchiveFormat::Zip, &wheel_path)?;
    {
        let archive: &mut dyn ArchiveWriter = archive.as_mut();
        let mut entries = vec![
            archive.add_file(init.as_bytes(), &format!("{name}/__init__.py"))?,
            archive.add_file_with_mode(
                &binary,
                &format!("{name}/bin/{bin_name}"),
                EXECUTABLE_FILE_MODE,
            )?,
            archive.add_file(
                entry_points(pypi).as_bytes(),
                &format!("{dist_info}/entry_points.txt"),
            )?,
            archive.add_file(metadata.as_bytes(), &format!("{dist_info}/METADATA"))?,
            archive.add_file(wheel_meta.as_bytes(), &format!("{dist_info}/WHEEL"))?,
        ];
        if let Some((license_name, bytes)) = &license {
            entries.push(archive.add_file(bytes, &format!("{dist_info}/licenses/{license_name}"))?);
        }

        let record = record(&dist_info, &entries);
        archive.add_file(record.as_bytes(), &format!("{dist_info}/RECORD"))?;
    }
    archive.finalize()?;

    Ok(wheel_path)
}
