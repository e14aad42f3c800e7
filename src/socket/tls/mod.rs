//! TLS connector built on BoringSSL.
//!
//! Every handshake is prepared through an optional [`SniSuppressor`], so a
//! connector without one behaves like a plain BoringSSL client.

use crate::base::neterror::NetError;
use crate::tls::sni::{ServerNameSink, SessionRequest, SniSuppressor};
use boring::ssl::{Ssl, SslConnector, SslMethod, SslRef, SslVersion};
use boring::x509::verify::X509CheckFlags;
use std::net::IpAddr;
use tokio::net::TcpStream;
use tokio_boring::SslStream;

pub mod options;

pub use self::options::{TlsOptions, TlsOptionsBuilder};

/// A TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsVersion(pub(crate) SslVersion);

impl TlsVersion {
    pub const TLS_1_0: TlsVersion = TlsVersion(SslVersion::TLS1);
    pub const TLS_1_1: TlsVersion = TlsVersion(SslVersion::TLS1_1);
    pub const TLS_1_2: TlsVersion = TlsVersion(SslVersion::TLS1_2);
    pub const TLS_1_3: TlsVersion = TlsVersion(SslVersion::TLS1_3);
}

/// Client-side TLS handshakes with per-host SNI control.
#[derive(Clone, Debug)]
pub struct TlsConnector {
    connector: SslConnector,
    sni: Option<SniSuppressor>,
}

impl TlsConnector {
    /// Builds a connector from `options`. Without a suppressor every
    /// handshake sends SNI for hostnames.
    pub fn new(options: &TlsOptions, sni: Option<SniSuppressor>) -> Result<Self, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        options.apply_to_builder(&mut builder)?;

        Ok(Self {
            connector: builder.build(),
            sni,
        })
    }

    pub fn sni_suppressor(&self) -> Option<&SniSuppressor> {
        self.sni.as_ref()
    }

    /// Prepares a client session for `host` through the session-establishment
    /// shape.
    ///
    /// When the suppressor clears the hostname, the handshake sends no SNI
    /// and skips the SNI-derived hostname check. The certificate is still
    /// verified against `host` through the X509 verify parameters.
    pub fn session_ssl(&self, host: &str) -> Result<Ssl, NetError> {
        let request = SessionRequest::client(host);
        let request = match &self.sni {
            Some(sni) => sni.establish_session(request),
            None => request,
        };

        let mut config = self
            .connector
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        config.set_use_server_name_indication(request.server_hostname.is_some());
        config.set_verify_hostname(request.check_hostname);
        if !request.check_hostname {
            verify_intended_host(&mut config, host)?;
        }

        // With SNI and the hostname check both off the domain is unused.
        let domain = request.server_hostname.as_deref().unwrap_or(host);
        config
            .into_ssl(domain)
            .map_err(|_| NetError::SslProtocolError)
    }

    /// Prepares a client session for `host` through the explicit-set shape:
    /// SNI is attached by a separate "set server name" call that the
    /// suppressor may drop.
    pub fn explicit_ssl(&self, host: &str) -> Result<Ssl, NetError> {
        let mut config = self
            .connector
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        config.set_use_server_name_indication(false);
        config.set_verify_hostname(false);
        verify_intended_host(&mut config, host)?;

        let mut ssl = config
            .into_ssl(host)
            .map_err(|_| NetError::SslProtocolError)?;

        if host.parse::<IpAddr>().is_err() {
            let sink: &mut SslRef = &mut ssl;
            match &self.sni {
                Some(sni) => sni.set_server_name(sink, host.as_bytes())?,
                None => sink.set_server_name(host)?,
            }
        }
        Ok(ssl)
    }

    /// Handshakes over `stream` using [`session_ssl`](Self::session_ssl).
    pub async fn connect(
        &self,
        stream: TcpStream,
        host: &str,
    ) -> Result<SslStream<TcpStream>, NetError> {
        let ssl = self.session_ssl(host)?;
        handshake(ssl, stream, host).await
    }

    /// Handshakes over `stream` using [`explicit_ssl`](Self::explicit_ssl).
    pub async fn connect_with_explicit_sni(
        &self,
        stream: TcpStream,
        host: &str,
    ) -> Result<SslStream<TcpStream>, NetError> {
        let ssl = self.explicit_ssl(host)?;
        handshake(ssl, stream, host).await
    }
}

async fn handshake(
    ssl: Ssl,
    stream: TcpStream,
    host: &str,
) -> Result<SslStream<TcpStream>, NetError> {
    tokio_boring::SslStreamBuilder::new(ssl, stream)
        .connect()
        .await
        .map_err(|e| {
            tracing::debug!(host = %host, error = ?e, "TLS handshake failed");
            NetError::SslProtocolError
        })
}

/// Pins certificate verification to `host` independently of SNI.
fn verify_intended_host(ssl: &mut SslRef, host: &str) -> Result<(), NetError> {
    let param = ssl.param_mut();
    param.set_hostflags(X509CheckFlags::NO_PARTIAL_WILDCARDS);
    let result = match host.parse::<IpAddr>() {
        Ok(ip) => param.set_ip(ip),
        Err(_) => param.set_host(host),
    };
    result.map_err(|_| NetError::SslProtocolError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::HostRegistry;
    use boring::ssl::NameType;

    fn connector(protected: &[&str]) -> TlsConnector {
        let hosts = HostRegistry::new();
        hosts.add_hosts(protected.iter().copied());
        TlsConnector::new(&TlsOptions::default(), Some(SniSuppressor::new(hosts))).unwrap()
    }

    #[test]
    fn test_session_ssl_suppresses_protected_host() {
        let tls = connector(&["protected.example"]);
        let ssl = tls.session_ssl("Protected.Example").unwrap();
        assert_eq!(ssl.servername(NameType::HOST_NAME), None);
    }

    #[test]
    fn test_session_ssl_keeps_sni_for_other_hosts() {
        let tls = connector(&["protected.example"]);
        let ssl = tls.session_ssl("open.example").unwrap();
        assert_eq!(ssl.servername(NameType::HOST_NAME), Some("open.example"));
    }

    #[test]
    fn test_ip_literal_never_carries_sni() {
        let tls = connector(&[]);
        let ssl = tls.session_ssl("192.0.2.1").unwrap();
        assert_eq!(ssl.servername(NameType::HOST_NAME), None);

        let ssl = tls.explicit_ssl("192.0.2.1").unwrap();
        assert_eq!(ssl.servername(NameType::HOST_NAME), None);
    }

    #[test]
    fn test_explicit_ssl() {
        let tls = connector(&["protected.example"]);

        let ssl = tls.explicit_ssl("protected.example").unwrap();
        assert_eq!(ssl.servername(NameType::HOST_NAME), None);

        let ssl = tls.explicit_ssl("open.example").unwrap();
        assert_eq!(ssl.servername(NameType::HOST_NAME), Some("open.example"));
    }

    #[test]
    fn test_without_suppressor_sends_sni() {
        let tls = TlsConnector::new(&TlsOptions::default(), None).unwrap();
        let ssl = tls.session_ssl("protected.example").unwrap();
        assert_eq!(ssl.servername(NameType::HOST_NAME), Some("protected.example"));
    }
}
