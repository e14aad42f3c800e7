use crate::base::context::{IoResultExt, TimeoutResultExt};
use crate::base::neterror::NetError;
use crate::dns::{AddrInfoHints, Name, Resolve, SocketAddrs};
use crate::socket::client::SocketType;
use crate::socket::tls::TlsConnector;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use url::{Host, Url};

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob.
///
/// Resolution goes through whatever [`Resolve`] the job was built with, so
/// a [`ResolutionDispatcher`](crate::dns::ResolutionDispatcher) here is
/// all it takes to route protected hosts through DoH.
#[derive(Clone)]
pub struct ConnectJob {
    resolver: Arc<dyn Resolve>,
    tls: Arc<TlsConnector>,
    connect_timeout: Option<Duration>,
}

impl ConnectJob {
    pub fn new(resolver: Arc<dyn Resolve>, tls: Arc<TlsConnector>) -> Self {
        Self {
            resolver,
            tls,
            connect_timeout: None,
        }
    }

    /// Bound each TCP connect attempt.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn tls(&self) -> &TlsConnector {
        &self.tls
    }

    /// Connects to the origin of `url`, with TLS for `https`.
    pub async fn connect(&self, url: &Url) -> Result<SocketType, NetError> {
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            _ => return Err(NetError::UnknownUrlScheme),
        };
        let host = target_host(url)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;

        // 1. DNS Resolution
        let addrs = self.resolve_target(&host, port).await?;

        // 2. TCP Connect, first address that answers wins
        let stream = self.connect_any(&host, port, &addrs).await?;

        // 3. SSL Handshake (if https)
        if secure {
            let tls_stream = self.tls.connect(stream, &host).await?;
            Ok(SocketType::Ssl(tls_stream))
        } else {
            Ok(SocketType::Tcp(stream))
        }
    }

    /// Addresses for `host:port`. IP literals skip the resolver; an empty
    /// resolver answer is a resolution failure.
    pub async fn resolve_target(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, NetError> {
        if let Some(addrs) = SocketAddrs::try_parse(host, port) {
            return Ok(addrs.collect());
        }

        let infos = self
            .resolver
            .resolve(Name::new(host), port, AddrInfoHints::stream())
            .await?;
        if infos.is_empty() {
            tracing::debug!(host = %host, "resolver returned no addresses");
            return Err(NetError::no_addresses(host));
        }
        Ok(infos.into_iter().map(|info| info.addr).collect())
    }

    async fn connect_any(
        &self,
        host: &str,
        port: u16,
        addrs: &[SocketAddr],
    ) -> Result<TcpStream, NetError> {
        let mut last_error = NetError::ConnectionFailed;
        for addr in addrs {
            let attempt = async { TcpStream::connect(addr).await.connection_context(host, port) };
            let result = match self.connect_timeout {
                Some(limit) => tokio::time::timeout(limit, attempt).await.connect_timeout(),
                None => attempt.await,
            };
            match result {
                Ok(stream) => {
                    tracing::debug!(host = %host, addr = %addr, "TCP connected");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(host = %host, addr = %addr, error = %e, "TCP connect failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

impl fmt::Debug for ConnectJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectJob")
            .field("tls", &self.tls)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

/// Host of `url` without IPv6 brackets.
pub(crate) fn target_host(url: &Url) -> Result<String, NetError> {
    match url.host() {
        Some(Host::Domain(domain)) => Ok(domain.to_string()),
        Some(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(Host::Ipv6(ip)) => Ok(ip.to_string()),
        None => Err(NetError::InvalidUrl),
    }
}
