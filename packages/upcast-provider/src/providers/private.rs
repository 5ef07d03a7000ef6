use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::data::RawRelease;
use crate::error::SourceError;
use crate::providers::github::{api_options, fetch_api_releases};
use crate::repo::RepoConfig;
use crate::source::ReleaseSource;

use upcast_utils::http::{http_status_is_success, FetchOptions, HttpFetch, HyperFetch};

/// A GitHub-compatible store at `RepoConfig::server_url`.
///
/// Assets are served through the store's API and usually answer with a
/// redirect to a short-lived object-storage link, so downloads are resolved
/// per request instead of being handed out directly.
pub struct PrivateSource {
    fetch: Arc<dyn HttpFetch>,
}

impl Default for PrivateSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivateSource {
    pub fn new() -> Self {
        PrivateSource {
            fetch: Arc::new(HyperFetch),
        }
    }

    pub fn with_fetch(mut self, fetch: Arc<dyn HttpFetch>) -> Self {
        self.fetch = fetch;
        self
    }

    fn server_base<'a>(&self, config: &'a RepoConfig) -> Result<&'a str, SourceError> {
        config.server_base().ok_or_else(|| {
            SourceError::UpstreamUnavailable(format!("no server url configured for {}", config.repo))
        })
    }
}

#[async_trait]
impl ReleaseSource for PrivateSource {
    fn get_friendly_name(&self) -> &'static str {
        "private"
    }

    async fn fetch_releases(&self, config: &RepoConfig) -> Result<Vec<RawRelease>, SourceError> {
        let base = self.server_base(config)?;
        let releases = fetch_api_releases(self.fetch.as_ref(), base, config).await?;
        Ok(releases
            .into_iter()
            .map(|r| r.into_raw(|asset| asset.url.clone()))
            .collect())
    }

    async fn resolve_download(
        &self,
        config: &RepoConfig,
        url: &str,
        api_url: Option<&str>,
    ) -> Result<String, SourceError> {
        let Some(api_url) = api_url else {
            return Ok(url.to_string());
        };
        let options: FetchOptions = api_options(config)
            .header("Accept", "application/octet-stream")
            .follow_redirects(false);
        let rsp = self
            .fetch
            .get(api_url, &options)
            .await
            .map_err(|e| SourceError::UpstreamUnavailable(format!("{}: {}", api_url, e)))?;

        if rsp.is_redirect() {
            if let Some(location) = rsp.location() {
                let signed = Url::parse(api_url)
                    .and_then(|base| base.join(location))
                    .map_err(|e| {
                        SourceError::UpstreamUnavailable(format!(
                            "{} redirected to an invalid location: {}",
                            api_url, e
                        ))
                    })?;
                return Ok(signed.to_string());
            }
        }
        if http_status_is_success(rsp.status) {
            // The store serves the bytes itself.
            return Ok(url.to_string());
        }
        Err(SourceError::UpstreamUnavailable(format!(
            "{} answered {}",
            api_url, rsp.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn releases_path(repo: &str) -> Matcher {
        Matcher::Regex(format!(r"^/repos/{}/releases(\?.*)?$", repo))
    }

    fn body(base: &str) -> String {
        format!(
            r#"[{{
                "tag_name": "2.0.0",
                "draft": false,
                "assets": [{{
                    "name": "App-2.0.0-mac.zip",
                    "url": "{base}/repos/owner/name/releases/assets/7",
                    "browser_download_url": "https://github.com/owner/name/releases/download/2.0.0/App-2.0.0-mac.zip",
                    "size": 42
                }}]
            }}]"#
        )
    }

    #[tokio::test]
    async fn test_private_fetch_uses_server_url() {
        let mut server = Server::new_async().await;
        let body = body(&server.url());
        let _m = server
            .mock("GET", releases_path("owner/name"))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let config = RepoConfig::new("owner/name")
            .with_token("secret")
            .with_server_url(&format!("{}/", server.url()));
        let releases = PrivateSource::new().fetch_releases(&config).await.unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(
            releases[0].assets[0].url,
            format!("{}/repos/owner/name/releases/assets/7", server.url())
        );
    }

    #[tokio::test]
    async fn test_private_repo_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", releases_path("owner/name"))
            .with_status(404)
            .create_async()
            .await;

        let config = RepoConfig::new("owner/name").with_server_url(&server.url());
        let result = PrivateSource::new().fetch_releases(&config).await;
        assert!(matches!(result, Err(SourceError::RepoNotFound(_))));
    }

    #[tokio::test]
    async fn test_private_resolve_download_follows_signed_link() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/owner/name/releases/assets/7")
            .match_header("accept", "application/octet-stream")
            .match_header("authorization", "Bearer secret")
            .with_status(302)
            .with_header(
                "location",
                "https://bucket.s3.amazonaws.com/asset-7?X-Amz-Signature=abc",
            )
            .create_async()
            .await;

        let config = RepoConfig::new("owner/name")
            .with_token("secret")
            .with_server_url(&server.url());
        let api_url = format!("{}/repos/owner/name/releases/assets/7", server.url());
        let location = PrivateSource::new()
            .resolve_download(&config, &api_url, Some(&api_url))
            .await
            .unwrap();
        assert_eq!(
            location,
            "https://bucket.s3.amazonaws.com/asset-7?X-Amz-Signature=abc"
        );
    }

    #[tokio::test]
    async fn test_private_resolve_download_direct_and_failure() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/assets/direct")
            .with_status(200)
            .with_body("bytes")
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/assets/gone")
            .with_status(410)
            .create_async()
            .await;

        let config = RepoConfig::new("owner/name").with_server_url(&server.url());
        let source = PrivateSource::new();

        let direct = format!("{}/assets/direct", server.url());
        let location = source
            .resolve_download(&config, &direct, Some(&direct))
            .await
            .unwrap();
        assert_eq!(location, direct);

        let gone = format!("{}/assets/gone", server.url());
        let result = source.resolve_download(&config, &gone, Some(&gone)).await;
        assert!(matches!(result, Err(SourceError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_private_without_server_url() {
        let result = PrivateSource::new()
            .fetch_releases(&RepoConfig::new("owner/name"))
            .await;
        assert!(matches!(result, Err(SourceError::UpstreamUnavailable(_))));
    }
}
