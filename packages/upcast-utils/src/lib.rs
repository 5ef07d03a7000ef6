pub mod http;
pub mod versioning;

// Re-export main utilities
pub use http::{
    get, http_get, http_status_is_success, https_get, BoxError, FetchOptions, HttpFetch,
    HyperFetch, ResponseData,
};
pub use versioning::{parse_tag, parse_version, ParsedTag, VersionError, DEFAULT_CHANNEL};
