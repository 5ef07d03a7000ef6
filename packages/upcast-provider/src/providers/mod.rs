//! Release source implementations.
//!
//! Both sources speak the GitHub releases API; they differ in where the API
//! lives and in how an asset becomes a download location.

pub mod github;
pub mod private;

pub use github::{GitHubSource, GITHUB_API_URL};
pub use private::PrivateSource;
