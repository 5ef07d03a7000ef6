use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Method, Response, StatusCode, Uri};
use semver::Version;
use std::sync::Arc;

use upcast_core::{Asset, ChannelResolver, Release, ResolveError};
use upcast_provider::RepoConfig;
use upcast_utils::parse_version;

use crate::types::{Action, Route, UpdateManifest};

pub type Body = http_body_util::Full<Bytes>;

fn empty(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn no_content() -> Response<Body> {
    empty(StatusCode::NO_CONTENT)
}

/// Answers `download` and `update` requests for one configured repository.
pub struct UpdateRequestHandler {
    resolver: Arc<ChannelResolver>,
    config: RepoConfig,
}

impl UpdateRequestHandler {
    pub fn new(resolver: Arc<ChannelResolver>, config: RepoConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<ChannelResolver> {
        &self.resolver
    }

    /// Unmatched routes and every failure answer `204 No Content`.
    pub async fn handle(&self, method: &Method, uri: &Uri) -> Response<Body> {
        if *method != Method::GET && *method != Method::HEAD {
            return empty(StatusCode::METHOD_NOT_ALLOWED);
        }
        let Some(route) = Route::parse(uri.path()) else {
            tracing::debug!(path = uri.path(), "no such route");
            return no_content();
        };

        let response = match route.action {
            Action::Download => self.download(&route).await,
            Action::Update => self.update(&route, client_version(uri)).await,
        };
        if *method == Method::HEAD {
            let (parts, _) = response.into_parts();
            return Response::from_parts(parts, Body::new(Bytes::new()));
        }
        response
    }

    async fn lookup(&self, route: &Route) -> Option<(Release, Asset)> {
        let snapshot = match self.resolver.snapshot(&self.config).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                log_resolve_error(&self.config, &error);
                return None;
            }
        };
        let release = snapshot.latest(&route.channel)?;
        let asset = release.find_asset(&route.platform)?;
        Some((release.clone(), asset.clone()))
    }

    async fn download(&self, route: &Route) -> Response<Body> {
        let Some((release, asset)) = self.lookup(route).await else {
            return no_content();
        };
        let location = match self.resolver.resolve_download(&self.config, &asset).await {
            Ok(location) => location,
            Err(error) => {
                log_resolve_error(&self.config, &error);
                return no_content();
            }
        };
        let Ok(value) = HeaderValue::from_str(&location) else {
            tracing::warn!(%location, "download location is not a valid header value");
            return no_content();
        };

        tracing::debug!(tag = %release.tag, asset = %asset.name, %location, "download");
        let mut response = empty(StatusCode::FOUND);
        response.headers_mut().insert(LOCATION, value);
        response
    }

    async fn update(&self, route: &Route, current: Option<Version>) -> Response<Body> {
        let Some((release, asset)) = self.lookup(route).await else {
            return no_content();
        };
        if current.is_some_and(|current| current >= release.version) {
            return no_content();
        }

        let manifest = UpdateManifest::new(&release, &asset);
        let body = match serde_json::to_vec(&manifest) {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(%error, "failed to encode update manifest");
                return no_content();
            }
        };
        let mut response = Response::new(Body::from(body));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// The `version` query parameter, if present and parseable.
fn client_version(uri: &Uri) -> Option<Version> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| *key == "version")
        .and_then(|(_, value)| parse_version(&value).ok())
}

fn log_resolve_error(config: &RepoConfig, error: &ResolveError) {
    if error.is_not_found() {
        tracing::debug!(repo = %config.repo, %error, "repository not found");
    } else {
        tracing::warn!(repo = %config.repo, %error, "upstream unavailable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_version() {
        let uri: Uri = "/update/win32?version=v1.2.3".parse().unwrap();
        assert_eq!(client_version(&uri), Some(Version::new(1, 2, 3)));

        let uri: Uri = "/update/win32?other=1&version=2.0.0-beta.1".parse().unwrap();
        assert_eq!(
            client_version(&uri),
            Some(Version::parse("2.0.0-beta.1").unwrap())
        );

        let uri: Uri = "/update/win32?version=latest".parse().unwrap();
        assert_eq!(client_version(&uri), None);

        let uri: Uri = "/update/win32".parse().unwrap();
        assert_eq!(client_version(&uri), None);
    }
}
