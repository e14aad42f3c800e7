//! DNS-over-HTTPS lookups using the JSON answer format.
//!
//! Queries go to a single fixed endpoint as
//! `GET <endpoint>?name=<host>&type=A` with `accept: application/dns-json`.
//! Only address records are kept from the answer; everything else is
//! skipped.

use crate::base::context::TimeoutResultExt;
use crate::base::neterror::NetError;
use crate::dns::{GaiResolver, Resolve};
use crate::http::streamfactory::HttpStreamFactory;
use crate::socket::connectjob::ConnectJob;
use crate::socket::tls::{TlsConnector, TlsOptions};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Cloudflare's JSON DoH endpoint.
pub const DEFAULT_DOH_ENDPOINT: &str = "https://cloudflare-dns.com/dns-query";

/// Media type of the JSON answer format.
pub const DNS_JSON_CONTENT_TYPE: &str = "application/dns-json";

/// Default bound on a single DoH round trip.
pub const DEFAULT_DOH_TIMEOUT: Duration = Duration::from_secs(10);

/// Address record types this resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record.
    #[default]
    #[serde(rename = "A")]
    A,
    /// IPv6 address record.
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Record types kept from an answer. Anything else is skipped.
    pub const HANDLED: [RecordType; 2] = [RecordType::A, RecordType::Aaaa];

    /// Numeric DNS type code.
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Aaaa => 28,
        }
    }

    /// Maps a numeric type code onto a handled record type.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::HANDLED.into_iter().find(|t| t.code() == code)
    }

    /// Value of the `type` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DoH query configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DohConfig {
    /// The JSON DoH endpoint.
    pub endpoint: Url,
    /// Record type requested in the `type` parameter.
    pub query_type: RecordType,
    /// Upper bound on one query; `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl Default for DohConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            query_type: RecordType::A,
            timeout: Some(DEFAULT_DOH_TIMEOUT),
        }
    }
}

fn default_endpoint() -> Url {
    // Constant input; failure would be a typo in DEFAULT_DOH_ENDPOINT.
    Url::parse(DEFAULT_DOH_ENDPOINT).unwrap_or_else(|e| panic!("bad default DoH endpoint: {e}"))
}

impl DohConfig {
    pub fn builder() -> DohConfigBuilder {
        DohConfigBuilder::new()
    }

    /// Host part of the endpoint; this host is always resolved natively.
    pub fn endpoint_host(&self) -> Option<&str> {
        self.endpoint.host_str()
    }
}

/// Builder for [`DohConfig`].
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct DohConfigBuilder {
    config: DohConfig,
}

impl DohConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different endpoint. Only `https` URLs with a host are accepted.
    pub fn endpoint(mut self, endpoint: &str) -> Result<Self, NetError> {
        let url = Url::parse(endpoint).map_err(|_| NetError::InvalidUrl)?;
        if url.scheme() != "https" {
            return Err(NetError::UnknownUrlScheme);
        }
        if url.host_str().is_none() {
            return Err(NetError::InvalidUrl);
        }
        self.config.endpoint = url;
        Ok(self)
    }

    pub fn query_type(mut self, query_type: RecordType) -> Self {
        self.config.query_type = query_type;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    pub fn build(self) -> DohConfig {
        self.config
    }
}

/// Address records from one answer, as parallel lists in answer order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DohAnswer {
    pub addresses: Vec<String>,
    pub ttls: Vec<u32>,
}

impl DohAnswer {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    fn push(&mut self, address: String, ttl: u32) {
        self.addresses.push(address);
        self.ttls.push(ttl);
    }
}

#[derive(Debug, Deserialize)]
struct DnsJsonResponse {
    #[serde(rename = "Status", default)]
    status: Option<u32>,
    #[serde(rename = "Answer", default)]
    answer: Option<Vec<DnsJsonRecord>>,
}

#[derive(Debug, Deserialize)]
struct DnsJsonRecord {
    #[serde(rename = "type")]
    record_type: u16,
    #[serde(default)]
    data: String,
    #[serde(rename = "TTL", default)]
    ttl: u32,
}

/// Parses a JSON DoH body into address/TTL lists.
///
/// A missing or empty `Answer` is an empty answer, not an error. Records of
/// unhandled types, and address records whose data is not an IP literal,
/// are skipped.
pub fn parse_dns_json(body: &[u8]) -> Result<DohAnswer, NetError> {
    let response: DnsJsonResponse = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "DoH body is not a JSON DNS answer");
        NetError::DnsMalformedResponse
    })?;

    if let Some(status) = response.status.filter(|s| *s != 0) {
        tracing::debug!(status, "DoH server reported non-zero DNS status");
    }

    let mut answer = DohAnswer::default();
    for record in response.answer.unwrap_or_default() {
        let Some(record_type) = RecordType::from_code(record.record_type) else {
            tracing::trace!(record_type = record.record_type, "skipping non-address record");
            continue;
        };
        if record.data.parse::<IpAddr>().is_err() {
            tracing::trace!(%record_type, data = %record.data, "skipping unparsable address");
            continue;
        }
        answer.push(record.data, record.ttl);
    }

    Ok(answer)
}

/// Alias for the `Future` type returned by a DoH transport.
pub type DohFetching = Pin<Box<dyn Future<Output = Result<Bytes, NetError>> + Send>>;

/// Performs the HTTPS GET for a fully built DoH query URL.
///
/// Implementations must send `accept: application/dns-json` and return the
/// body of a successful response; non-success statuses map to
/// `DnsServerFailed`.
pub trait DohTransport: Send + Sync {
    fn get(&self, url: Url) -> DohFetching;
}

impl<T: DohTransport + ?Sized> DohTransport for Arc<T> {
    fn get(&self, url: Url) -> DohFetching {
        (**self).get(url)
    }
}

/// DoH transport over this crate's own HTTP/1.1 stack.
///
/// The endpoint is resolved by a native resolver and the handshake never
/// suppresses SNI, so the DoH request can never recurse into the
/// interception layer.
#[derive(Clone)]
pub struct HttpsTransport {
    factory: HttpStreamFactory,
}

impl HttpsTransport {
    /// Transport resolving the endpoint through `getaddrinfo`.
    pub fn new() -> Result<Self, NetError> {
        Self::with_resolver(Arc::new(GaiResolver::new()))
    }

    /// Transport resolving the endpoint through `native`.
    fn with_resolver(native: Arc<dyn Resolve>) -> Result<Self, NetError> {
        let tls = TlsConnector::new(&TlsOptions::default(), None)?;
        let job = ConnectJob::new(native, Arc::new(tls));
        Ok(Self {
            factory: HttpStreamFactory::new(Arc::new(job)),
        })
    }
}

impl fmt::Debug for HttpsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpsTransport").finish_non_exhaustive()
    }
}

impl DohTransport for HttpsTransport {
    fn get(&self, url: Url) -> DohFetching {
        let factory = self.factory.clone();
        Box::pin(async move {
            let mut stream = factory.request_stream(&url).await?;
            let mut headers = http::HeaderMap::new();
            headers.insert(
                http::header::ACCEPT,
                http::HeaderValue::from_static(DNS_JSON_CONTENT_TYPE),
            );

            let response = stream.get(&url, headers).await?;
            if !response.status().is_success() {
                tracing::debug!(status = %response.status(), "DoH server returned an error status");
                return Err(NetError::DnsServerFailed);
            }
            response.bytes().await
        })
    }
}

/// Resolves hostnames through a DoH endpoint.
pub struct DohResolver {
    config: DohConfig,
    transport: Arc<dyn DohTransport>,
}

impl DohResolver {
    pub fn new(config: DohConfig, transport: Arc<dyn DohTransport>) -> Self {
        Self { config, transport }
    }

    /// Resolver using [`HttpsTransport`] with `getaddrinfo` for the endpoint.
    pub fn with_https(config: DohConfig) -> Result<Self, NetError> {
        Ok(Self::new(config, Arc::new(HttpsTransport::new()?)))
    }

    pub fn config(&self) -> &DohConfig {
        &self.config
    }

    /// True if `host` is the endpoint's own hostname.
    pub fn is_endpoint(&self, host: &str) -> bool {
        self.config
            .endpoint_host()
            .is_some_and(|endpoint| endpoint.eq_ignore_ascii_case(host))
    }

    /// The query URL for `host`.
    pub fn query_url(&self, host: &str) -> Url {
        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("name", host)
            .append_pair("type", self.config.query_type.as_str());
        url
    }

    /// Queries the endpoint for `host`.
    ///
    /// Transport, status, parse and timeout failures are returned as errors
    /// and never retried here. An empty answer is `Ok`.
    pub async fn resolve(&self, host: &str) -> Result<DohAnswer, NetError> {
        let url = self.query_url(host);
        tracing::debug!(host = %host, endpoint = %self.config.endpoint, "querying DoH");

        let fetch = self.transport.get(url);
        let body = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.dns_timeout()?,
            None => fetch.await?,
        };

        let answer = parse_dns_json(&body)?;
        tracing::debug!(host = %host, count = answer.len(), "DoH answer parsed");
        Ok(answer)
    }
}

impl fmt::Debug for DohResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DohResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
