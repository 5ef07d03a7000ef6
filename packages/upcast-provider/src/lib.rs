pub mod data;
pub mod error;
pub mod providers;
pub mod repo;
pub mod source;

// Re-export common types
pub use data::{RawAsset, RawRelease};
pub use error::SourceError;
pub use providers::{GitHubSource, PrivateSource, GITHUB_API_URL};
pub use repo::{normalize_repo, RepoConfig};
pub use source::ReleaseSource;

use std::sync::Arc;

/// Picks the source a repository configuration is served from.
#[derive(Clone)]
pub struct SourceManager {
    public: Arc<dyn ReleaseSource>,
    private: Arc<dyn ReleaseSource>,
}

impl Default for SourceManager {
    fn default() -> Self {
        Self::new(Arc::new(GitHubSource::new()), Arc::new(PrivateSource::new()))
    }
}

impl SourceManager {
    pub fn new(public: Arc<dyn ReleaseSource>, private: Arc<dyn ReleaseSource>) -> Self {
        Self { public, private }
    }

    /// Serve every configuration from one source.
    pub fn single(source: Arc<dyn ReleaseSource>) -> Self {
        Self::new(source.clone(), source)
    }

    /// The default sources, with public GitHub reached through `api_base`.
    pub fn with_github_api(api_base: &str) -> Self {
        Self::new(
            Arc::new(GitHubSource::new().with_api_base(api_base)),
            Arc::new(PrivateSource::new()),
        )
    }

    pub fn get_source(&self, config: &RepoConfig) -> &Arc<dyn ReleaseSource> {
        if config.is_private() {
            &self.private
        } else {
            &self.public
        }
    }
}
