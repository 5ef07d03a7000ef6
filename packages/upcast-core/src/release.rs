use chrono::{DateTime, Utc};
use semver::Version;
use std::collections::HashMap;

use upcast_provider::{RawAsset, RawRelease};
use upcast_utils::versioning::{parse_tag, VersionError};

use crate::platform::{derive_platform_token, match_asset};

/// Channel name to the newest release on that channel.
pub type ChannelMap = HashMap<String, Release>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub url: String,
    pub api_url: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
    pub platform_token: Option<String>,
}

impl Asset {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            api_url: None,
            content_type: None,
            size: 0,
            platform_token: derive_platform_token(name),
        }
    }
}

impl From<RawAsset> for Asset {
    fn from(raw: RawAsset) -> Self {
        let platform_token = derive_platform_token(&raw.name);
        Self {
            name: raw.name,
            url: raw.url,
            api_url: raw.api_url,
            content_type: raw.content_type,
            size: raw.size,
            platform_token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub version: Version,
    pub channel: String,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub assets: Vec<Asset>,
}

impl Release {
    pub fn from_raw(raw: RawRelease) -> Result<Self, VersionError> {
        let parsed = parse_tag(&raw.tag)?;
        Ok(Self {
            tag: raw.tag,
            version: parsed.version,
            channel: parsed.channel,
            name: raw.name,
            notes: raw.notes,
            published_at: raw.published_at,
            assets: raw.assets.into_iter().map(Asset::from).collect(),
        })
    }

    pub fn find_asset(&self, platform: &str) -> Option<&Asset> {
        match_asset(&self.assets, platform)
    }
}

/// Parse a provider listing, dropping drafts and releases whose tag is not a
/// semantic version. Order is preserved.
pub fn parse_releases(raw: Vec<RawRelease>) -> Vec<Release> {
    raw.into_iter()
        .filter(|r| !r.draft)
        .filter_map(|r| match Release::from_raw(r) {
            Ok(release) => Some(release),
            Err(error) => {
                tracing::warn!(%error, "skipping release");
                None
            }
        })
        .collect()
}

/// Keep, per channel, the release with the greatest version. On equal
/// versions the first one listed wins.
pub fn latest_by_channel(releases: &[Release]) -> ChannelMap {
    let mut channels = ChannelMap::new();
    for release in releases {
        match channels.get(&release.channel) {
            Some(current) if current.version >= release.version => {}
            _ => {
                channels.insert(release.channel.clone(), release.clone());
            }
        }
    }
    channels
}

/// Everything one fetch of a repository resolved to.
#[derive(Debug, Clone, Default)]
pub struct ChannelSnapshot {
    pub releases: Vec<Release>,
    pub channels: ChannelMap,
}

impl ChannelSnapshot {
    pub fn build(raw: Vec<RawRelease>) -> Self {
        let releases = parse_releases(raw);
        let channels = latest_by_channel(&releases);
        Self { releases, channels }
    }

    pub fn latest(&self, channel: &str) -> Option<&Release> {
        self.channels.get(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upcast_utils::DEFAULT_CHANNEL;

    fn raw(tag: &str) -> RawRelease {
        RawRelease {
            tag: tag.to_string(),
            name: None,
            notes: None,
            draft: false,
            published_at: None,
            assets: vec![RawAsset {
                name: format!("App-{}.dmg", tag),
                url: format!("https://example.com/{}.dmg", tag),
                api_url: None,
                content_type: None,
                size: 1,
            }],
        }
    }

    #[test]
    fn test_parse_skips_drafts_and_bad_tags() {
        let mut draft = raw("2.0.0");
        draft.draft = true;
        let releases = parse_releases(vec![draft, raw("1.1.0"), raw("nightly"), raw("1.0.0")]);
        let tags: Vec<&str> = releases.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["1.1.0", "1.0.0"]);
    }

    #[test]
    fn test_assets_get_platform_tokens() {
        let release = Release::from_raw(raw("1.0.0")).unwrap();
        assert_eq!(release.assets[0].platform_token.as_deref(), Some("darwin"));
        assert!(release.find_asset("darwin").is_some());
        assert!(release.find_asset("win32").is_none());
    }

    #[test]
    fn test_latest_by_channel() {
        let releases = parse_releases(vec![
            raw("1.2.0-prerelease.2"),
            raw("1.1.0+vendor-a"),
            raw("1.2.0-prerelease.10"),
            raw("1.0.9"),
            raw("1.1.0"),
            raw("1.0.0+vendor-a"),
        ]);
        let channels = latest_by_channel(&releases);

        assert_eq!(channels.len(), 3);
        assert_eq!(channels[DEFAULT_CHANNEL].tag, "1.1.0");
        assert_eq!(channels["prerelease"].tag, "1.2.0-prerelease.10");
        assert_eq!(channels["vendor-a"].tag, "1.1.0+vendor-a");
        for (channel, release) in &channels {
            assert_eq!(&release.channel, channel);
        }
    }

    #[test]
    fn test_latest_by_channel_is_order_independent() {
        let forward = parse_releases(vec![raw("1.0.0"), raw("1.0.1"), raw("0.9.0")]);
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(
            latest_by_channel(&forward)[DEFAULT_CHANNEL].tag,
            latest_by_channel(&backward)[DEFAULT_CHANNEL].tag
        );
    }

    #[test]
    fn test_equal_versions_keep_first_listed() {
        let releases = parse_releases(vec![raw("v1.0.0"), raw("1.0.0")]);
        assert_eq!(latest_by_channel(&releases)[DEFAULT_CHANNEL].tag, "v1.0.0");
    }

    #[test]
    fn test_empty_listing() {
        let snapshot = ChannelSnapshot::build(vec![]);
        assert!(snapshot.releases.is_empty());
        assert!(snapshot.channels.is_empty());
        assert!(snapshot.latest(DEFAULT_CHANNEL).is_none());
    }
}
