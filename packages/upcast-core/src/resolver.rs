use std::sync::Arc;
use std::time::Duration;

use upcast_cache::SingleFlightCache;
use upcast_provider::{ReleaseSource, RepoConfig, SourceError, SourceManager};

use crate::error::ResolveError;
use crate::release::{Asset, ChannelMap, ChannelSnapshot, Release};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Resolves repositories into channels, caching one snapshot per repository.
pub struct ChannelResolver {
    sources: SourceManager,
    cache: SingleFlightCache<Arc<ChannelSnapshot>, SourceError>,
}

impl Default for ChannelResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ChannelResolver {
    pub fn new(ttl: Duration) -> Self {
        Self::with_sources(SourceManager::default(), ttl)
    }

    pub fn with_sources(sources: SourceManager, ttl: Duration) -> Self {
        Self {
            sources,
            cache: SingleFlightCache::new(ttl),
        }
    }

    /// Serve every repository from `source`.
    pub fn with_source(source: Arc<dyn ReleaseSource>, ttl: Duration) -> Self {
        Self::with_sources(SourceManager::single(source), ttl)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// The current snapshot for `config`, fetching it if the cache has none
    /// or it expired.
    pub async fn snapshot(&self, config: &RepoConfig) -> Result<Arc<ChannelSnapshot>, ResolveError> {
        let source = self.sources.get_source(config);
        let key = config.fingerprint();
        let snapshot = self
            .cache
            .get_or_fetch(&key, || async {
                let raw = source.fetch_releases(config).await?;
                let snapshot = ChannelSnapshot::build(raw);
                tracing::debug!(
                    repo = %key,
                    source = source.get_friendly_name(),
                    releases = snapshot.releases.len(),
                    channels = snapshot.channels.len(),
                    "resolved release list"
                );
                Ok::<_, SourceError>(Arc::new(snapshot))
            })
            .await?;
        Ok(snapshot)
    }

    /// Recent releases in provider order, unparseable tags skipped.
    pub async fn get_release_list(&self, config: &RepoConfig) -> Result<Vec<Release>, ResolveError> {
        Ok(self.snapshot(config).await?.releases.clone())
    }

    pub async fn latest_by_channel(&self, config: &RepoConfig) -> Result<ChannelMap, ResolveError> {
        Ok(self.snapshot(config).await?.channels.clone())
    }

    /// Where a client fetching `asset` should be sent.
    pub async fn resolve_download(
        &self,
        config: &RepoConfig,
        asset: &Asset,
    ) -> Result<String, ResolveError> {
        let location = self
            .sources
            .get_source(config)
            .resolve_download(config, &asset.url, asset.api_url.as_deref())
            .await?;
        Ok(location)
    }

    /// Drop the cached snapshot so the next request refetches.
    pub async fn invalidate(&self, config: &RepoConfig) {
        self.cache.invalidate(&config.fingerprint()).await;
    }
}
