//! Structural validation of the merged configuration value.
//!
//! Runs on the untyped value so every failure names the exact field, before
//! typed deserialization.

use super::ConfigError;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Node `process.platform` values accepted for `npm.binaryPackages.*.os`.
pub const NODE_PLATFORMS: &[&str] = &[
    "aix", "android", "darwin", "freebsd", "linux", "netbsd", "openbsd", "sunos", "win32",
];

/// Node `process.arch` values accepted for `npm.binaryPackages.*.arch`.
pub const NODE_ARCHES: &[&str] = &[
    "arm", "arm64", "ia32", "loong64", "mips", "mipsel", "ppc", "ppc64", "riscv64", "s390",
    "s390x", "x64",
];

const ARCHIVE_FORMATS: &[&str] = &["zip", "tar.gz"];

type Result = std::result::Result<(), ConfigError>;

/// Validates the merged configuration. `base_dir` anchors readme and license
/// existence checks.
pub fn validate(root: &Value, base_dir: &Path) -> Result {
    let binaries = match root.get("binaries") {
        Some(Value::Mapping(map)) => map,
        _ => {
            return Err(ConfigError::validation(
                "binaries",
                "is required and must be an object mapping platform to binary path.",
            ));
        }
    };
    for (id, path) in binaries {
        let id = key_str(id);
        if !is_non_empty_str(path) {
            return Err(ConfigError::validation(
                format!("binaries.{id}"),
                "must be a non-empty path.",
            ));
        }
    }

    validate_pack(root.get("pack"))?;

    if let Some(npm) = section(root, "npm")? {
        validate_npm(npm, binaries, base_dir)?;
    }
    if let Some(pypi) = section(root, "pypi")? {
        validate_pypi(pypi, binaries, base_dir)?;
    }
    if let Some(github) = section(root, "github")? {
        validate_github(github, binaries)?;
    }

    Ok(())
}

fn section<'a>(root: &'a Value, name: &str) -> std::result::Result<Option<&'a Value>, ConfigError> {
    match root.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Mapping(_)) => Ok(Some(value)),
        Some(_) => Err(ConfigError::validation(name, "must be an object if provided.")),
    }
}

fn validate_pack(pack: Option<&Value>) -> Result {
    let Some(pack @ Value::Mapping(_)) = pack else {
        return Err(ConfigError::validation(
            "pack",
            "is required and must be an object with a \"dir\" property.",
        ));
    };
    if !pack.get("dir").is_some_and(is_non_empty_str) {
        return Err(ConfigError::validation(
            "pack.dir",
            "is required and must be a non-empty string.",
        ));
    }
    optional_non_empty_str(pack, "prePackCommand", "pack.prePackCommand")?;
    match pack.get("clearDir") {
        None | Some(Value::Bool(_)) => Ok(()),
        Some(_) => Err(ConfigError::validation(
            "pack.clearDir",
            "must be a boolean if provided.",
        )),
    }
}

fn validate_npm(npm: &Value, binaries: &Mapping, base_dir: &Path) -> Result {
    let package_json = match npm.get("packageJson") {
        Some(value @ Value::Mapping(_)) => value,
        _ => {
            return Err(ConfigError::validation(
                "npm.packageJson",
                "is required and must include a \"name\" and \"version\".",
            ));
        }
    };
    required_non_empty_str(package_json, "name", "npm.packageJson.name")?;
    required_non_empty_str(package_json, "version", "npm.packageJson.version")?;

    match npm.get("binaryPackages") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(packages)) => {
            for (id, info) in packages {
                let id = key_str(id);
                let field = format!("npm.binaryPackages.{id}");
                if !binaries.contains_key(id) {
                    return Err(ConfigError::validation(
                        field,
                        format!("references platform \"{id}\" which is not listed in \"binaries\"."),
                    ));
                }
                if !info.is_mapping() {
                    return Err(ConfigError::validation(
                        field,
                        "must be an object with \"os\" and \"arch\" properties.",
                    ));
                }
                let os = required_non_empty_str(info, "os", &format!("{field}.os"))?;
                if !NODE_PLATFORMS.contains(&os) {
                    return Err(ConfigError::validation(
                        format!("{field}.os"),
                        format!("must be one of: {}.", NODE_PLATFORMS.join(", ")),
                    ));
                }
                let arch = required_non_empty_str(info, "arch", &format!("{field}.arch"))?;
                if !NODE_ARCHES.contains(&arch) {
                    return Err(ConfigError::validation(
                        format!("{field}.arch"),
                        format!("must be one of: {}.", NODE_ARCHES.join(", ")),
                    ));
                }
            }
        }
        Some(_) => {
            return Err(ConfigError::validation(
                "npm.binaryPackages",
                "must be an object with \"os\" and \"arch\" properties for each binary if provided.",
            ));
        }
    }

    string_list(npm, "binNames", "npm.binNames")?;
    publish_flags(npm, "npm.publish")?;
    existing_file(npm, "readmeFile", "npm.readmeFile", base_dir)?;
    existing_file(npm, "licenseFile", "npm.licenseFile", base_dir)?;
    Ok(())
}

fn validate_pypi(pypi: &Value, binaries: &Mapping, base_dir: &Path) -> Result {
    let metadata = match pypi.get("metadata") {
        Some(value @ Value::Mapping(_)) => value,
        _ => {
            return Err(ConfigError::validation(
                "pypi.metadata",
                "is required and must include a \"Name\" and \"Version\".",
            ));
        }
    };
    required_non_empty_str(metadata, "Name", "pypi.metadata.Name")?;
    required_non_empty_str(metadata, "Version", "pypi.metadata.Version")?;

    let Some(Value::Mapping(tags)) = pypi.get("platformTags") else {
        return Err(ConfigError::validation(
            "pypi.platformTags",
            "is required and must be an object mapping platform to PyPI tag.",
        ));
    };
    for (id, tag) in tags {
        let id = key_str(id);
        let field = format!("pypi.platformTags.{id}");
        if !binaries.contains_key(id) {
            return Err(ConfigError::validation(
                field,
                format!("references platform \"{id}\" which is not listed in \"binaries\"."),
            ));
        }
        if !is_non_empty_str(tag) {
            return Err(ConfigError::validation(field, "must be a non-empty wheel platform tag."));
        }
    }

    string_list(pypi, "entryPointNames", "pypi.entryPointNames")?;
    publish_flags(pypi, "pypi.publish")?;
    existing_file(pypi, "readmeFile", "pypi.readmeFile", base_dir)?;
    existing_file(pypi, "licenseFile", "pypi.licenseFile", base_dir)?;
    Ok(())
}

fn validate_github(github: &Value, binaries: &Mapping) -> Result {
    for key in ["owner", "repo", "token"] {
        required_non_empty_str(github, key, &format!("github.{key}"))?;
    }

    let archives = match github.get("archives") {
        Some(value @ Value::Mapping(_)) => value,
        _ => {
            return Err(ConfigError::validation(
                "github.archives",
                "is required and must be an object with a \"formats\" property.",
            ));
        }
    };
    let Some(Value::Mapping(formats)) = archives.get("formats") else {
        return Err(ConfigError::validation(
            "github.archives.formats",
            "is required and must map archive ids to a format or a {format, files} descriptor.",
        ));
    };
    for (id, spec) in formats {
        let id = key_str(id);
        let field = format!("github.archives.formats.{id}");
        match spec {
            Value::String(format) => {
                if !ARCHIVE_FORMATS.contains(&format.as_str()) {
                    return Err(ConfigError::validation(
                        field,
                        format!("must be one of: {}.", ARCHIVE_FORMATS.join(", ")),
                    ));
                }
                if !binaries.contains_key(id) {
                    return Err(ConfigError::validation(
                        field,
                        format!(
                            "uses the shorthand form but \"binaries\" has no entry for \"{id}\"."
                        ),
                    ));
                }
            }
            Value::Mapping(_) => {
                let format = spec.get("format").and_then(Value::as_str);
                if !format.is_some_and(|f| ARCHIVE_FORMATS.contains(&f)) {
                    return Err(ConfigError::validation(
                        format!("{field}.format"),
                        format!("must be one of: {}.", ARCHIVE_FORMATS.join(", ")),
                    ));
                }
                let Some(Value::Sequence(files)) = spec.get("files") else {
                    return Err(ConfigError::validation(
                        format!("{field}.files"),
                        "must be an array of file globs.",
                    ));
                };
                glob_list(files, &format!("{field}.files"))?;
            }
            _ => {
                return Err(ConfigError::validation(
                    field,
                    "must be a format string or an object with \"format\" and \"files\" properties.",
                ));
            }
        }
    }

    optional_non_empty_str(archives, "prefix", "github.archives.prefix")?;
    optional_glob_list(archives, "extraFiles", "github.archives.extraFiles")?;
    optional_glob_list(github, "files", "github.files")?;

    match github.get("release") {
        None | Some(Value::Null) | Some(Value::Mapping(_)) => Ok(()),
        Some(_) => Err(ConfigError::validation(
            "github.release",
            "must be an object if provided.",
        )),
    }
}

fn key_str(key: &Value) -> &str {
    key.as_str().unwrap_or("<non-string key>")
}

fn is_non_empty_str(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

fn required_non_empty_str<'a>(
    parent: &'a Value,
    key: &str,
    field: &str,
) -> std::result::Result<&'a str, ConfigError> {
    match parent.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ConfigError::validation(
            field,
            "is required and must be a non-empty string.",
        )),
    }
}

fn optional_non_empty_str(parent: &Value, key: &str, field: &str) -> Result {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(value) if is_non_empty_str(value) => Ok(()),
        Some(_) => Err(ConfigError::validation(
            field,
            "must be a non-empty string if provided.",
        )),
    }
}

fn string_list(parent: &Value, key: &str, field: &str) -> Result {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Sequence(items)) if items.iter().all(is_non_empty_str) => Ok(()),
        Some(_) => Err(ConfigError::validation(
            field,
            "must be an array of non-empty strings if provided.",
        )),
    }
}

fn publish_flags(parent: &Value, field: &str) -> Result {
    match parent.get("publish") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Mapping(flags)) => {
            for (flag, value) in flags {
                let ok = matches!(value, Value::Null | Value::Bool(_) | Value::Number(_))
                    || is_non_empty_str(value);
                if !ok {
                    return Err(ConfigError::validation(
                        format!("{field}.{}", key_str(flag)),
                        "must be a non-empty string, a number, a boolean or null.",
                    ));
                }
            }
            Ok(())
        }
        Some(_) => Err(ConfigError::validation(
            field,
            "must be an object mapping publish cli flags to values if provided.",
        )),
    }
}

fn existing_file(parent: &Value, key: &str, field: &str, base_dir: &Path) -> Result {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(value) => {
            let Some(path) = value.as_str().filter(|s| !s.trim().is_empty()) else {
                return Err(ConfigError::validation(
                    field,
                    "must be a non-empty string if provided.",
                ));
            };
            if base_dir.join(path).is_file() {
                Ok(())
            } else {
                Err(ConfigError::validation(
                    field,
                    format!("does not exist at path: {path}"),
                ))
            }
        }
    }
}

fn is_file_glob(value: &Value) -> bool {
    match value {
        Value::String(_) => is_non_empty_str(value),
        Value::Mapping(_) => {
            value.get("cwd").is_some_and(is_non_empty_str)
                && value.get("pattern").is_some_and(is_non_empty_str)
        }
        _ => false,
    }
}

fn glob_list(items: &[Value], field: &str) -> Result {
    match items.iter().position(|item| !is_file_glob(item)) {
        None => Ok(()),
        Some(idx) => Err(ConfigError::validation(
            format!("{field}.{idx}"),
            "must be a non-empty pattern string or an object with non-empty \"cwd\" and \"pattern\".",
        )),
    }
}

fn optional_glob_list(parent: &Value, key: &str, field: &str) -> Result {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Sequence(items)) => glob_list(items, field),
        Some(_) => Err(ConfigError::validation(
            field,
            "must be an array of file globs if provided.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(yaml: &str) -> std::result::Result<(), ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "# demo").unwrap();
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        validate(&value, dir.path())
    }

    fn field_of(result: std::result::Result<(), ConfigError>) -> String {
        match result {
            Err(ConfigError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    const BASE: &str = "binaries: {linux-x64: ./demo, win-x64: ./demo.exe}\npack: {dir: dist}\n";

    #[test]
    fn minimal_config_is_valid() {
        check(BASE).unwrap();
    }

    #[test]
    fn requires_binaries_and_pack_dir() {
        assert_eq!(field_of(check("pack: {dir: dist}")), "binaries");
        assert_eq!(field_of(check("binaries: {}\npack: {}")), "pack.dir");
        assert_eq!(field_of(check("binaries: {}")), "pack");
        assert_eq!(
            field_of(check("binaries: {}\npack: {dir: dist, prePackCommand: '  '}")),
            "pack.prePackCommand"
        );
    }

    #[test]
    fn npm_requires_name_and_version() {
        let yaml = format!("{BASE}npm: {{packageJson: {{name: demo}}}}");
        assert_eq!(field_of(check(&yaml)), "npm.packageJson.version");
    }

    #[test]
    fn npm_binary_packages_must_reference_binaries() {
        let yaml = format!(
            "{BASE}npm: {{packageJson: {{name: demo, version: '1.0.0'}}, binaryPackages: {{darwin-arm64: {{os: darwin, arch: arm64}}}}}}"
        );
        assert_eq!(field_of(check(&yaml)), "npm.binaryPackages.darwin-arm64");
    }

    #[test]
    fn npm_binary_packages_use_node_values() {
        let yaml = format!(
            "{BASE}npm: {{packageJson: {{name: demo, version: '1.0.0'}}, binaryPackages: {{win-x64: {{os: windows, arch: x64}}}}}}"
        );
        assert_eq!(field_of(check(&yaml)), "npm.binaryPackages.win-x64.os");

        let yaml = format!(
            "{BASE}npm: {{packageJson: {{name: demo, version: '1.0.0'}}, binaryPackages: {{win-x64: {{os: win32, arch: amd64}}}}}}"
        );
        assert_eq!(field_of(check(&yaml)), "npm.binaryPackages.win-x64.arch");
    }

    #[test]
    fn npm_readme_must_exist() {
        let ok = format!(
            "{BASE}npm: {{packageJson: {{name: demo, version: '1.0.0'}}, readmeFile: README.md}}"
        );
        check(&ok).unwrap();

        let missing = format!(
            "{BASE}npm: {{packageJson: {{name: demo, version: '1.0.0'}}, licenseFile: LICENSE}}"
        );
        assert_eq!(field_of(check(&missing)), "npm.licenseFile");
    }

    #[test]
    fn publish_flags_accept_scalars() {
        let yaml = format!(
            "{BASE}npm: {{packageJson: {{name: demo, version: '1.0.0'}}, publish: {{access: public, 'registry=https://registry.npmjs.org/': true, dry-run: null}}}}"
        );
        check(&yaml).unwrap();

        let yaml = format!(
            "{BASE}npm: {{packageJson: {{name: demo, version: '1.0.0'}}, publish: {{access: ''}}}}"
        );
        assert_eq!(field_of(check(&yaml)), "npm.publish.access");
    }

    #[test]
    fn pypi_requires_platform_tags() {
        let yaml = format!("{BASE}pypi: {{metadata: {{Name: demo, Version: '1.0.0'}}}}");
        assert_eq!(field_of(check(&yaml)), "pypi.platformTags");

        let yaml = format!(
            "{BASE}pypi: {{metadata: {{Name: demo, Version: '1.0.0'}}, platformTags: {{linux-arm64: manylinux_2_17_aarch64}}}}"
        );
        assert_eq!(field_of(check(&yaml)), "pypi.platformTags.linux-arm64");
    }

    #[test]
    fn github_requires_credentials() {
        let yaml = format!(
            "{BASE}github: {{owner: me, repo: tool, token: '', archives: {{formats: {{}}}}}}"
        );
        assert_eq!(field_of(check(&yaml)), "github.token");
    }

    #[test]
    fn github_archive_descriptors_are_checked() {
        let ok = format!(
            "{BASE}github: {{owner: me, repo: tool, token: t, archives: {{formats: {{linux-x64: tar.gz, src: {{format: zip, files: [README.md, {{cwd: src, pattern: '**/*'}}]}}}}}}}}"
        );
        check(&ok).unwrap();

        let bad_format = format!(
            "{BASE}github: {{owner: me, repo: tool, token: t, archives: {{formats: {{linux-x64: rar}}}}}}"
        );
        assert_eq!(field_of(check(&bad_format)), "github.archives.formats.linux-x64");

        let bad_glob = format!(
            "{BASE}github: {{owner: me, repo: tool, token: t, archives: {{formats: {{src: {{format: zip, files: [{{cwd: ' ', pattern: '*'}}]}}}}}}}}"
        );
        assert_eq!(field_of(check(&bad_glob)), "github.archives.formats.src.files.0");
    }

    #[test]
    fn github_shorthand_must_reference_binaries() {
        let yaml = format!(
            "{BASE}github: {{owner: me, repo: tool, token: t, archives: {{formats: {{darwin-arm64: tar.gz}}}}}}"
        );
        assert_eq!(field_of(check(&yaml)), "github.archives.formats.darwin-arm64");
    }

    #[test]
    fn github_extra_files_are_globs() {
        let yaml = format!(
            "{BASE}github: {{owner: me, repo: tool, token: t, archives: {{formats: {{}}, extraFiles: [LICENSE, 3]}}}}"
        );
        assert_eq!(field_of(check(&yaml)), "github.archives.extraFiles.1");
    }
}
