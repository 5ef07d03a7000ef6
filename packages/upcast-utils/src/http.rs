use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{header, StatusCode, Uri};
#[cfg(not(feature = "rustls-platform-verifier"))]
use hyper_rustls::ConfigBuilderExt;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use once_cell::sync::Lazy;
use rustls::ClientConfig;
#[cfg(feature = "rustls-platform-verifier")]
use rustls_platform_verifier::BuilderVerifierExt;
use std::{collections::HashMap, fmt};
use url::Url;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    /// The URL that produced this response, after any followed redirects.
    pub url: String,
}

impl ResponseData {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }

    pub fn is_redirect(&self) -> bool {
        StatusCode::from_u16(self.status).is_ok_and(|s| s.is_redirection())
    }
}

impl fmt::Display for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response status: {}, body: {}",
            self.status,
            self.body.as_ref().map_or_else(
                || "".to_string(),
                |body| String::from_utf8_lossy(body).to_string(),
            )
        )
    }
}

/// Options for a single [`HttpFetch::get`] call.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    pub follow_redirects: bool,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}

/// Perform a GET and hand back status, headers and body.
///
/// Release sources depend on this capability instead of a concrete client so
/// that they can be driven by a fake in tests.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str, options: &FetchOptions) -> Result<ResponseData, BoxError>;
}

/// [`HttpFetch`] backed by the hyper legacy client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperFetch;

#[async_trait]
impl HttpFetch for HyperFetch {
    async fn get(&self, url: &str, options: &FetchOptions) -> Result<ResponseData, BoxError> {
        let mut current = Url::parse(url)?;
        let mut headers = options.headers.clone();
        let mut hops = 0;
        loop {
            let rsp = get(current.as_str().parse()?, &headers).await?;
            if !options.follow_redirects || !rsp.is_redirect() {
                return Ok(rsp);
            }
            let Some(location) = rsp.location() else {
                return Ok(rsp);
            };
            hops += 1;
            if hops > MAX_REDIRECTS {
                return Err(format!("too many redirects fetching {}", url).into());
            }
            let next = current.join(location)?;
            // Credentials stay with the origin that was asked for.
            if next.origin() != current.origin() {
                headers.retain(|k, _| !k.eq_ignore_ascii_case("authorization"));
            }
            tracing::debug!(from = %current, to = %next, "following redirect");
            current = next;
        }
    }
}

pub async fn get(url: Uri, header_map: &HashMap<String, String>) -> Result<ResponseData, BoxError> {
    if url.scheme_str() == Some("https") {
        https_get(url, header_map).await
    } else {
        http_get(url, header_map).await
    }
}

pub async fn http_get(
    url: Uri,
    header_map: &HashMap<String, String>,
) -> Result<ResponseData, BoxError> {
    let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
    send(client, url, header_map).await
}

pub async fn https_get(
    url: Uri,
    header_map: &HashMap<String, String>,
) -> Result<ResponseData, BoxError> {
    let client = Client::builder(TokioExecutor::new()).build(https_config()?);
    send(client, url, header_map).await
}

async fn send<C>(
    client: Client<C, Empty<Bytes>>,
    url: Uri,
    header_map: &HashMap<String, String>,
) -> Result<ResponseData, BoxError>
where
    C: hyper_util::client::legacy::connect::Connect + Clone + Send + Sync + 'static,
{
    let mut req = hyper::Request::builder().method("GET").uri(url.clone());
    for (key, value) in header_map {
        req = req.header(key, value);
    }
    let req = req.body(Empty::<Bytes>::new())?;
    let res = client.request(req).await?;
    let status = res.status();
    let headers = res
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = res.into_body().collect().await?.to_bytes();
    Ok(ResponseData {
        status: status.as_u16(),
        headers,
        body: Some(body),
        url: url.to_string(),
    })
}

static PROVIDER: Lazy<std::sync::Arc<rustls::crypto::CryptoProvider>> =
    Lazy::new(|| std::sync::Arc::new(rustls::crypto::ring::default_provider()));

fn https_config() -> Result<hyper_rustls::HttpsConnector<HttpConnector>, BoxError> {
    let provider = PROVIDER.clone();
    let tls: ClientConfig;
    #[cfg(feature = "rustls-platform-verifier")]
    {
        tls = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_platform_verifier()?
            .with_no_client_auth();
    }
    #[cfg(all(feature = "webpki-roots", not(feature = "rustls-platform-verifier")))]
    {
        tls = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_webpki_roots()
            .with_no_client_auth();
    }
    #[cfg(all(
        feature = "native-tokio",
        not(feature = "webpki-roots"),
        not(feature = "rustls-platform-verifier")
    ))]
    {
        tls = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_native_roots()?
            .with_no_client_auth();
    }
    #[cfg(all(
        not(feature = "native-tokio"),
        not(feature = "webpki-roots"),
        not(feature = "rustls-platform-verifier")
    ))]
    {
        compile_error!("No TLS backend enabled");
    }
    Ok(hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build())
}

pub fn http_status_is_success(status: u16) -> bool {
    StatusCode::from_u16(status).is_ok_and(|s| s.is_success())
}
