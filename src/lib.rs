//! Upcast - a release mirror that serves desktop app downloads and updates
//!
//! Releases are read from GitHub or a GitHub-compatible store, grouped into
//! update channels by their version tags and served over HTTP as download
//! redirects and update manifests.

pub use upcast_cache as cache;
pub use upcast_config as config;
pub use upcast_core as core;
pub use upcast_provider as provider;
pub use upcast_server as server;
pub use upcast_utils as utils;

// Re-export commonly used types for convenience
pub use upcast_cache::SingleFlightCache;
pub use upcast_config::{AppConfig, ConfigError, ServerConfig};
pub use upcast_core::{Asset, ChannelMap, ChannelResolver, Release, ResolveError};
pub use upcast_provider::{
    GitHubSource, PrivateSource, ReleaseSource, RepoConfig, SourceError, SourceManager,
};
pub use upcast_server::{UpdateManifest, UpdateRequestHandler, UpdateServer};
pub use upcast_utils::{parse_tag, DEFAULT_CHANNEL};
