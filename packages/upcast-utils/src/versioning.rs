//! Tag parsing and channel derivation.
//!
//! A release tag is a semantic version. Its suffixes decide which update
//! channel the release is published on:
//!
//! * `1.2.0+vendor-a` is on channel `vendor-a` (build metadata, verbatim)
//! * `1.2.0-prerelease.1` is on channel `prerelease` (first prerelease segment)
//! * `1.2.0` is on the default channel [`DEFAULT_CHANNEL`]
//!
//! Build metadata takes precedence when a tag carries both suffixes.

use semver::Version;

pub const DEFAULT_CHANNEL: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("unparseable version tag {tag:?}: {reason}")]
    Unparseable { tag: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub version: Version,
    pub channel: String,
}

pub fn parse_tag(tag: &str) -> Result<ParsedTag, VersionError> {
    let version = parse_version(tag)?;
    let channel = channel_of(&version);
    Ok(ParsedTag { version, channel })
}

/// Parse a strict `MAJOR.MINOR.PATCH[-PRE][+BUILD]` string, tolerating one
/// leading `v`.
pub fn parse_version(tag: &str) -> Result<Version, VersionError> {
    let trimmed = tag.trim();
    let bare = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(bare).map_err(|e| VersionError::Unparseable {
        tag: tag.to_string(),
        reason: e.to_string(),
    })
}

pub fn channel_of(version: &Version) -> String {
    if !version.build.is_empty() {
        return version.build.as_str().to_string();
    }
    if !version.pre.is_empty() {
        let pre = version.pre.as_str();
        return pre.split('.').next().unwrap_or(pre).to_string();
    }
    DEFAULT_CHANNEL.to_string()
}
