//! GitHub release upload.
//!
//! The client is built once per publish run from `github.owner`, `repo` and
//! `token`; nothing is cached across runs.

use crate::config::{Config, GithubConfig, PassthroughMap};
use anyhow::{Context as _, Result, bail};
use bytes::Bytes;
use reqwest::{StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use url::Url;

const API_BASE: &str = "https://api.github.com/";

/// Release fields used for uploads.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub id: u64,
    pub upload_url: String,
    #[serde(default)]
    pub html_url: String,
}

/// Authenticated client for one repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: Url,
    owner: String,
    repo: String,
}

impl GithubClient {
    pub fn new(github: &GithubConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("bin-upload/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", github.token))
            .context("github.token is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_base: Url::parse(API_BASE)?,
            owner: github.owner.clone(),
            repo: github.repo.clone(),
        })
    }

    fn releases_url(&self, suffix: &str) -> Result<Url> {
        Ok(self
            .api_base
            .join(&format!("repos/{}/{}/releases{suffix}", self.owner, self.repo))?)
    }

    /// Release tagged `tag`, if it exists.
    pub async fn release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let url = self.releases_url(&format!("/tags/{tag}"))?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.json().await?))
    }

    /// Creates a release from `body` (`tag_name`, `name`, `body`, `draft`, ...).
    pub async fn create_release(&self, body: &PassthroughMap) -> Result<Release> {
        let url = self.releases_url("")?;
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()
            .context("failed to create GitHub release")?;
        Ok(response.json().await?)
    }

    /// Reuses the release for `release.tag_name` or creates it.
    pub async fn get_or_create_release(&self, release: &PassthroughMap) -> Result<Release> {
        let body = release_body(release)?;
        let tag = body
            .get("tag_name")
            .and_then(Value::as_str)
            .context("github.release.tag_name is required to publish")?;

        if let Some(existing) = self.release_by_tag(tag).await? {
            log::info!("Using existing GitHub release {tag}");
            return Ok(existing);
        }

        log::info!("Creating GitHub release {tag}");
        self.create_release(&body).await
    }

    /// Uploads `path` as an asset named after its file name.
    pub async fn upload_asset(&self, release: &Release, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", path.display()))?;
        let url = upload_url(&release.upload_url, &name)?;
        let contents = Bytes::from(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        );

        self.http
            .post(url)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(contents)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("failed to upload {name}"))?;
        Ok(())
    }
}

/// Release request body: configured fields, with `name` defaulting to the
/// tag.
pub fn release_body(release: &PassthroughMap) -> Result<PassthroughMap> {
    let mut body = release.clone();
    let tag = match body.get("tag_name") {
        Some(Value::String(tag)) if !tag.trim().is_empty() => tag.clone(),
        _ => bail!("github.release.tag_name is required to publish"),
    };
    if !matches!(body.get("name"), Some(Value::String(_))) {
        body.insert("name".into(), json!(tag));
    }
    Ok(body)
}

/// Expands the `{?name,label}` upload URL template for `name`.
pub fn upload_url(template: &str, name: &str) -> Result<Url> {
    let base = template.split('{').next().unwrap_or(template);
    let mut url = Url::parse(base).with_context(|| format!("invalid upload url: {template}"))?;
    url.query_pairs_mut().append_pair("name", name);
    Ok(url)
}

/// Files under `{pack.dir}/github`, sorted.
pub fn assets(config: &Config) -> Result<Vec<PathBuf>> {
    let dir = config.output_dir("github");
    require_artifact_dir(&dir)?;

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(&dir).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn require_artifact_dir(dir: &Path) -> Result<()> {
    anyhow::ensure!(
        dir.is_dir(),
        "{} does not exist. Run `bin-upload pack` first.",
        dir.display()
    );
    Ok(())
}

/// Creates (or reuses) the release and uploads every GitHub artifact.
pub async fn publish(config: &Config) -> Result<i32> {
    let github = config
        .github
        .as_ref()
        .context("GitHub configuration is missing")?;
    let assets = assets(config)?;
    anyhow::ensure!(!assets.is_empty(), "No GitHub artifacts to upload");

    let client = GithubClient::new(github)?;
    let release = client.get_or_create_release(&github.release).await?;
    log::info!("Uploading {} asset(s) to release {}", assets.len(), release.id);

    let mut exit_code = 0;
    for asset in &assets {
        match client.upload_asset(&release, asset).await {
            Ok(()) => log::info!("Uploaded {}", asset.display()),
            Err(e) => {
                log::error!("Failed to upload {}: {e:#}", asset.display());
                exit_code = 1;
            }
        }
    }

    if !release.html_url.is_empty() {
        log::info!("Release: {}", release.html_url);
    }
    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_upload_template() {
        let url = upload_url(
            "https://uploads.github.com/repos/me/demo/releases/1/assets{?name,label}",
            "demo linux.tar.gz",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://uploads.github.com/repos/me/demo/releases/1/assets?name=demo+linux.tar.gz"
        );
    }

    #[test]
    fn release_name_defaults_to_tag() {
        let release = json!({"tag_name": "v1.0.0", "draft": true});
        let body = release_body(release.as_object().unwrap()).unwrap();
        assert_eq!(body["name"], "v1.0.0");
        assert_eq!(body["draft"], true);

        let named = json!({"tag_name": "v1.0.0", "name": "First"});
        assert_eq!(release_body(named.as_object().unwrap()).unwrap()["name"], "First");
    }

    #[test]
    fn tag_is_required() {
        assert!(release_body(&PassthroughMap::new()).is_err());
    }

    #[test]
    fn releases_url_includes_repository() {
        let github = GithubConfig {
            owner: "me".into(),
            repo: "demo".into(),
            token: "t".into(),
            archives: crate::config::ArchivesConfig {
                prefix: None,
                formats: Default::default(),
                extra_files: Vec::new(),
            },
            files: Vec::new(),
            release: PassthroughMap::new(),
        };
        let client = GithubClient::new(&github).unwrap();
        assert_eq!(
            client.releases_url("/tags/v1").unwrap().as_str(),
            "https://api.github.com/repos/me/demo/releases/tags/v1"
        );
    }
}
