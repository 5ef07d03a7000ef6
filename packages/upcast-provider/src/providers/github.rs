use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::data::{RawAsset, RawRelease};
use crate::error::SourceError;
use crate::repo::RepoConfig;
use crate::source::ReleaseSource;

use upcast_utils::http::{http_status_is_success, FetchOptions, HttpFetch, HyperFetch};

pub const GITHUB_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "upcast";
const PER_PAGE: u32 = 100;

/// Release record of the GitHub REST API, also spoken by GitHub Enterprise and
/// Gitea.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<ApiAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiAsset {
    pub name: String,
    pub url: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
}

impl ApiRelease {
    pub(crate) fn into_raw(self, download_url: impl Fn(&ApiAsset) -> String) -> RawRelease {
        let assets = self
            .assets
            .iter()
            .map(|asset| RawAsset {
                name: asset.name.clone(),
                url: download_url(asset),
                api_url: Some(asset.url.clone()),
                content_type: asset.content_type.clone(),
                size: asset.size,
            })
            .collect();
        RawRelease {
            tag: self.tag_name,
            name: self.name.filter(|n| !n.trim().is_empty()),
            notes: self.body.filter(|b| !b.trim().is_empty()),
            draft: self.draft,
            published_at: self.published_at,
            assets,
        }
    }
}

pub(crate) fn api_options(config: &RepoConfig) -> FetchOptions {
    let options = FetchOptions::new()
        .header("User-Agent", USER_AGENT)
        .header("Accept", "application/vnd.github+json");
    match config.token() {
        Some(token) => options.header("Authorization", &format!("Bearer {}", token)),
        None => options,
    }
}

/// List releases of `config`'s repository from a GitHub-compatible API rooted
/// at `api_base`.
pub(crate) async fn fetch_api_releases(
    fetch: &dyn HttpFetch,
    api_base: &str,
    config: &RepoConfig,
) -> Result<Vec<ApiRelease>, SourceError> {
    let repo = config.owner_and_name()?;
    let url = format!(
        "{}/repos/{}/releases?per_page={}",
        api_base.trim_end_matches('/'),
        repo,
        PER_PAGE
    );
    tracing::debug!(%url, "fetching release list");

    let options = api_options(config).follow_redirects(true);
    let rsp = fetch
        .get(&url, &options)
        .await
        .map_err(|e| SourceError::UpstreamUnavailable(format!("{}: {}", url, e)))?;

    if rsp.status == 404 {
        return Err(SourceError::RepoNotFound(repo));
    }
    if !http_status_is_success(rsp.status) {
        return Err(SourceError::UpstreamUnavailable(format!(
            "{} answered {}",
            url, rsp.status
        )));
    }
    let body = rsp.body.unwrap_or_default();
    serde_json::from_slice::<Vec<ApiRelease>>(&body).map_err(|e| {
        SourceError::UpstreamUnavailable(format!("{} returned an invalid release list: {}", url, e))
    })
}

/// Public GitHub. Asset downloads point at `github.com` release URLs.
pub struct GitHubSource {
    api_base: String,
    fetch: Arc<dyn HttpFetch>,
}

impl Default for GitHubSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubSource {
    pub fn new() -> Self {
        GitHubSource {
            api_base: GITHUB_API_URL.to_string(),
            fetch: Arc::new(HyperFetch),
        }
    }

    /// Talk to another API root, e.g. a caching reverse proxy.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_fetch(mut self, fetch: Arc<dyn HttpFetch>) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl ReleaseSource for GitHubSource {
    fn get_friendly_name(&self) -> &'static str {
        "github"
    }

    async fn fetch_releases(&self, config: &RepoConfig) -> Result<Vec<RawRelease>, SourceError> {
        let releases = fetch_api_releases(self.fetch.as_ref(), &self.api_base, config).await?;
        Ok(releases
            .into_iter()
            .map(|r| r.into_raw(|asset| asset.browser_download_url.clone()))
            .collect())
    }
}
