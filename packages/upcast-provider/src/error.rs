#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The network call failed or the provider answered with a non-success status.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The repository does not exist or is not visible with the given credential.
    #[error("repository not found: {0}")]
    RepoNotFound(String),
}
