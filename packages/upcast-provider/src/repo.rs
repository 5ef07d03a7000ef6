use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

static URL_PREFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://[^/]+/|git@[^:/]+:)").unwrap());

/// The repository a release mirror is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// `owner/name`, or a full hosting URL such as `https://github.com/owner/name`.
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Base URL of a GitHub-compatible private store. Public GitHub is used
    /// when absent.
    #[serde(default, alias = "serverUrl")]
    pub server_url: Option<String>,
}

impl RepoConfig {
    pub fn new(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            token: None,
            server_url: None,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_server_url(mut self, server_url: &str) -> Self {
        self.server_url = Some(server_url.to_string());
        self
    }

    /// The credential, if one is configured and not blank.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// The private store base without trailing slashes, if one is configured.
    pub fn server_base(&self) -> Option<&str> {
        self.server_url
            .as_deref()
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
    }

    pub fn is_private(&self) -> bool {
        self.server_base().is_some()
    }

    pub fn owner_and_name(&self) -> Result<String, SourceError> {
        normalize_repo(&self.repo)
    }

    /// Cache identity: the normalized repository plus the store it lives on.
    /// Both identifier forms of one repository share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let repo = normalize_repo(&self.repo)
            .unwrap_or_else(|_| self.repo.trim().to_string())
            .to_ascii_lowercase();
        format!("{}@{}", repo, self.server_base().unwrap_or("github"))
    }
}

/// Reduce a repository identifier to `owner/name`.
///
/// Accepts the short form, a hosting URL (any scheme and host, optional
/// trailing path, `.git` suffix) or an scp-like `git@host:owner/name` remote.
pub fn normalize_repo(repo: &str) -> Result<String, SourceError> {
    let trimmed = repo.trim();
    let path = URL_PREFIX_REGEX.replace(trimmed, "");
    let mut segments: Vec<&str> = path
        .split(['/', '?', '#'])
        .take_while(|s| !s.is_empty())
        .collect();
    // `github.com/owner/name` without a scheme
    let schemeless = path.len() == trimmed.len();
    if schemeless && segments.first().is_some_and(|s| s.contains('.')) {
        if segments.len() < 3 {
            return Err(SourceError::RepoNotFound(repo.to_string()));
        }
        segments.remove(0);
    }
    match segments.as_slice() {
        [owner, name, ..] => {
            let name = name.strip_suffix(".git").unwrap_or(*name);
            if name.is_empty() {
                return Err(SourceError::RepoNotFound(repo.to_string()));
            }
            Ok(format!("{}/{}", owner, name))
        }
        _ => Err(SourceError::RepoNotFound(repo.to_string())),
    }
}
