pub mod app_config;
pub mod error;

// Re-export common types
pub use app_config::{
    AppConfig, ServerConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_LISTEN, ENV_CACHE_TTL,
    ENV_GITHUB_API_URL, ENV_LISTEN, ENV_REPO, ENV_SERVER_URL, ENV_TOKEN,
};
pub use error::ConfigError;
pub use upcast_provider::RepoConfig;
