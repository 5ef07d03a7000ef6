use async_trait::async_trait;

use crate::data::RawRelease;
use crate::error::SourceError;
use crate::repo::RepoConfig;

/// A place releases are listed from.
///
/// Implementations perform exactly one upstream attempt per call and keep no
/// state between calls; caching and retries belong to the caller.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    fn get_friendly_name(&self) -> &'static str;

    /// Releases in provider order, most recent first.
    async fn fetch_releases(&self, config: &RepoConfig) -> Result<Vec<RawRelease>, SourceError>;

    /// Turn an asset into the location a client should be redirected to.
    ///
    /// `url` is the asset's download url, `api_url` its provider API location
    /// if known. Sources whose downloads are public return `url` unchanged.
    async fn resolve_download(
        &self,
        _config: &RepoConfig,
        url: &str,
        _api_url: Option<&str>,
    ) -> Result<String, SourceError> {
        Ok(url.to_string())
    }
}
