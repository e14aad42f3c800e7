use super::TlsVersion;
use crate::base::neterror::NetError;
use boring::ssl::{SslConnectorBuilder, SslOptions, SslVerifyMode};
use boring::x509::X509;

/// Builder for `TlsOptions`.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct TlsOptionsBuilder {
    config: TlsOptions,
}

/// TLS connection configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions {
    /// ALPN protocols. The client speaks HTTP/1.1 only.
    pub alpn_protocols: Option<Vec<String>>,

    /// Minimum TLS version.
    pub min_tls_version: Option<TlsVersion>,

    /// Maximum TLS version.
    pub max_tls_version: Option<TlsVersion>,

    /// Enable session tickets.
    pub session_ticket: bool,

    /// Cipher suite configuration string.
    pub cipher_list: Option<String>,

    /// Supported curves list.
    pub curves_list: Option<String>,

    /// Supported signature algorithms.
    pub sigalgs_list: Option<String>,

    /// Verify the peer certificate chain.
    pub verify_peer: bool,

    /// Extra trust anchors (PEM), added on top of the system store.
    pub root_certificates: Vec<Vec<u8>>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            alpn_protocols: Some(vec!["http/1.1".to_string()]),
            min_tls_version: Some(TlsVersion::TLS_1_2),
            max_tls_version: Some(TlsVersion::TLS_1_3),
            session_ticket: true,
            cipher_list: None,
            curves_list: None,
            sigalgs_list: None,
            verify_peer: true,
            root_certificates: Vec::new(),
        }
    }
}

impl TlsOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpn_protocols(mut self, alpn: &[&str]) -> Self {
        self.config.alpn_protocols = Some(alpn.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn min_tls_version(mut self, version: TlsVersion) -> Self {
        self.config.min_tls_version = Some(version);
        self
    }

    pub fn max_tls_version(mut self, version: TlsVersion) -> Self {
        self.config.max_tls_version = Some(version);
        self
    }

    pub fn session_ticket(mut self, enabled: bool) -> Self {
        self.config.session_ticket = enabled;
        self
    }

    pub fn cipher_list(mut self, ciphers: &str) -> Self {
        self.config.cipher_list = Some(ciphers.to_string());
        self
    }

    pub fn curves_list(mut self, curves: &str) -> Self {
        self.config.curves_list = Some(curves.to_string());
        self
    }

    pub fn sigalgs_list(mut self, sigalgs: &str) -> Self {
        self.config.sigalgs_list = Some(sigalgs.to_string());
        self
    }

    /// Trusts the PEM-encoded certificate `pem` as an additional root.
    pub fn root_certificate_pem(mut self, pem: &[u8]) -> Self {
        self.config.root_certificates.push(pem.to_vec());
        self
    }

    /// Disables chain verification. Only meant for local test servers.
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.config.verify_peer = false;
        self
    }

    pub fn build(self) -> TlsOptions {
        self.config
    }
}

impl TlsOptions {
    pub fn builder() -> TlsOptionsBuilder {
        TlsOptionsBuilder::new()
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_tls_version {
            builder
                .set_min_proto_version(Some(min.0))
                .map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_tls_version {
            builder
                .set_max_proto_version(Some(max.0))
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if let Some(ciphers) = &self.cipher_list {
            builder
                .set_cipher_list(ciphers)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if let Some(protos) = &self.alpn_protocols {
            if !protos.is_empty() {
                builder
                    .set_alpn_protos(&alpn_wire_format(protos)?)
                    .map_err(|_| NetError::SslProtocolError)?;
            }
        }

        if let Some(sigalgs) = &self.sigalgs_list {
            builder
                .set_sigalgs_list(sigalgs)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if let Some(curves) = &self.curves_list {
            builder
                .set_curves_list(curves)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.session_ticket {
            builder.set_options(SslOptions::NO_TICKET);
        }

        for pem in &self.root_certificates {
            let cert = X509::from_pem(pem).map_err(|_| NetError::SslProtocolError)?;
            builder
                .cert_store_mut()
                .add_cert(cert)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if self.verify_peer {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(())
    }
}

/// Length-prefixed ALPN list as sent in the ClientHello.
pub(crate) fn alpn_wire_format(protos: &[String]) -> Result<Vec<u8>, NetError> {
    let mut wire = Vec::new();
    for proto in protos {
        let len = u8::try_from(proto.len()).map_err(|_| NetError::SslProtocolError)?;
        wire.push(len);
        wire.extend_from_slice(proto.as_bytes());
    }
    Ok(wire)
}
