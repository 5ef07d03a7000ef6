use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One release as reported by a source, before tag parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRelease {
    pub tag: String,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub draft: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub assets: Vec<RawAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAsset {
    pub name: String,
    /// Where a client should download the file from.
    pub url: String,
    /// Provider API location of the asset, if the source exposes one.
    pub api_url: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
}
