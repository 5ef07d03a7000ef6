use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use upcast_provider::{normalize_repo, RepoConfig};

use crate::error::ConfigError;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 15 * 60;

pub const ENV_REPO: &str = "UPCAST_REPO";
pub const ENV_TOKEN: &str = "UPCAST_TOKEN";
pub const ENV_SERVER_URL: &str = "UPCAST_SERVER_URL";
pub const ENV_LISTEN: &str = "UPCAST_LISTEN";
pub const ENV_CACHE_TTL: &str = "UPCAST_CACHE_TTL";
pub const ENV_GITHUB_API_URL: &str = "UPCAST_GITHUB_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    pub cache_ttl_secs: u64,
    /// Public GitHub API root, for reverse proxies and tests.
    pub github_api_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            github_api_url: None,
        }
    }
}

impl ServerConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "listen".to_string(),
                value: self.listen.clone(),
            })
    }
}

/// Everything the service needs to run.
///
/// The file format keeps the repository keys at the top level:
///
/// ```json
/// {
///   "repo": "acme/desktop-app",
///   "token": "ghp_...",
///   "server_url": "https://git.example.com/api/v1",
///   "server": { "listen": "0.0.0.0:8080", "cache_ttl_secs": 300 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn new(repo: RepoConfig) -> Self {
        Self {
            repo,
            server: ServerConfig::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path` if given, then apply the `UPCAST_*` environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`. Unset and empty variables are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(repo) = var(ENV_REPO) {
            self.repo.repo = repo;
        }
        if let Some(token) = var(ENV_TOKEN) {
            self.repo.token = Some(token);
        }
        if let Some(server_url) = var(ENV_SERVER_URL) {
            self.repo.server_url = Some(server_url);
        }
        if let Some(listen) = var(ENV_LISTEN) {
            self.server.listen = listen;
        }
        if let Some(ttl) = var(ENV_CACHE_TTL) {
            self.server.cache_ttl_secs =
                ttl.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_CACHE_TTL.to_string(),
                        value: ttl.clone(),
                    })?;
        }
        if let Some(api_url) = var(ENV_GITHUB_API_URL) {
            self.server.github_api_url = Some(api_url);
        }
        Ok(())
    }

    /// Check the merged configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repo.repo.trim().is_empty() {
            return Err(ConfigError::MissingRepo);
        }
        normalize_repo(&self.repo.repo).map_err(|_| ConfigError::InvalidValue {
            key: "repo".to_string(),
            value: self.repo.repo.clone(),
        })?;
        self.server.listen_addr()?;
        Ok(())
    }
}
