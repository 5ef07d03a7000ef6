use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use upcast_core::{Asset, Release};
use upcast_utils::DEFAULT_CHANNEL;

/// Body of a successful `update` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    /// The release tag.
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    /// Where the client downloads the asset. For a private store this is the
    /// asset's API URL on the store host: it returns the binary only when
    /// requested with `Accept: application/octet-stream` and the repository
    /// token as `Authorization: Bearer <token>`; otherwise it answers with the
    /// asset's JSON metadata.
    pub url: String,
}

impl UpdateManifest {
    pub fn new(release: &Release, asset: &Asset) -> Self {
        Self {
            name: release.tag.clone(),
            version: release.version.to_string(),
            notes: release.notes.clone(),
            pub_date: release
                .published_at
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            url: asset.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    Update,
}

impl Action {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "download" => Some(Action::Download),
            "update" => Some(Action::Update),
            _ => None,
        }
    }
}

/// `/{action}/{channel?}/{platform}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub action: Action,
    pub channel: String,
    pub platform: String,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (action, channel, platform) = match segments.as_slice() {
            [action, platform] => (action, DEFAULT_CHANNEL, platform),
            [action, channel, platform] => (action, *channel, platform),
            _ => return None,
        };
        Some(Route {
            action: Action::parse(action)?,
            channel: channel.to_string(),
            platform: platform.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_parse() {
        assert_eq!(
            Route::parse("/download/win32"),
            Some(Route {
                action: Action::Download,
                channel: "latest".to_string(),
                platform: "win32".to_string(),
            })
        );
        assert_eq!(
            Route::parse("/update/prerelease/darwin-arm64/"),
            Some(Route {
                action: Action::Update,
                channel: "prerelease".to_string(),
                platform: "darwin-arm64".to_string(),
            })
        );
    }

    #[test]
    fn test_route_parse_rejects() {
        for path in [
            "/",
            "/download",
            "/download/a/b/c",
            "/install/win32",
            "/Download/win32",
        ] {
            assert_eq!(Route::parse(path), None, "{}", path);
        }
    }

    #[test]
    fn test_manifest_omits_absent_fields() {
        let manifest = UpdateManifest {
            name: "v1.0.0".to_string(),
            version: "1.0.0".to_string(),
            notes: None,
            pub_date: None,
            url: "https://example.com/app.zip".to_string(),
        };
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "v1.0.0",
                "version": "1.0.0",
                "url": "https://example.com/app.zip"
            })
        );
    }
}
