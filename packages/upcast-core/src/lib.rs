//! Channel resolution on top of release sources.
//!
//! [`ChannelResolver`] turns a repository's release listing into a
//! [`ChannelSnapshot`]: the parsed releases plus the newest release of every
//! channel. [`platform`] picks the asset a given platform should download.

pub mod error;
pub mod platform;
pub mod release;
pub mod resolver;

pub use error::ResolveError;
pub use platform::{canonical_platform, derive_platform_token, match_asset};
pub use release::{latest_by_channel, parse_releases, Asset, ChannelMap, ChannelSnapshot, Release};
pub use resolver::{ChannelResolver, DEFAULT_CACHE_TTL};
