//! SNI suppression for protected hosts.
//!
//! Two TLS integration points attach a hostname indicator to a handshake:
//! establishing a session with a requested `server_hostname`, and an
//! explicit "set server name" call on an open connection object. Both go
//! through [`SniSuppressor::decide`].

use crate::base::neterror::NetError;
use crate::dns::HostRegistry;
use boring::ssl::SslRef;

/// What a handshake should do with its hostname indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniDecision {
    /// Send the hostname indicator.
    pub send_indicator: bool,
    /// Skip the verification that matches the certificate against the
    /// indicator value.
    pub skip_hostname_fast_verify: bool,
}

impl SniDecision {
    pub const PASS_THROUGH: SniDecision = SniDecision {
        send_indicator: true,
        skip_hostname_fast_verify: false,
    };

    pub const SUPPRESS: SniDecision = SniDecision {
        send_indicator: false,
        skip_hostname_fast_verify: true,
    };

    pub fn is_suppressed(&self) -> bool {
        !self.send_indicator
    }
}

/// Parameters of a TLS session about to be established over an existing
/// transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub server_side: bool,
    /// Hostname to send as SNI; `None` sends none.
    pub server_hostname: Option<String>,
    /// Match the certificate against `server_hostname` during the handshake.
    pub check_hostname: bool,
}

impl SessionRequest {
    /// A client-side request that sends `host` and checks it.
    pub fn client(host: impl Into<String>) -> Self {
        Self {
            server_side: false,
            server_hostname: Some(host.into()),
            check_hostname: true,
        }
    }
}

/// Receiver of an explicit "set server name" call.
pub trait ServerNameSink {
    fn set_server_name(&mut self, name: &str) -> Result<(), NetError>;
}

impl ServerNameSink for SslRef {
    fn set_server_name(&mut self, name: &str) -> Result<(), NetError> {
        self.set_hostname(name).map_err(|e| {
            tracing::debug!(error = %e, "failed to set SNI hostname");
            NetError::SslProtocolError
        })
    }
}

/// Decides, per handshake, whether the hostname indicator is sent.
///
/// Stateless apart from the shared [`HostRegistry`].
#[derive(Debug, Clone, Default)]
pub struct SniSuppressor {
    hosts: HostRegistry,
}

impl SniSuppressor {
    pub fn new(hosts: HostRegistry) -> Self {
        Self { hosts }
    }

    pub fn hosts(&self) -> &HostRegistry {
        &self.hosts
    }

    /// Suppress for registered hosts; pass everything else through,
    /// including an absent hostname.
    pub fn decide(&self, hostname: Option<&str>) -> SniDecision {
        match hostname {
            Some(host) if self.hosts.is_protected(host) => SniDecision::SUPPRESS,
            _ => SniDecision::PASS_THROUGH,
        }
    }

    /// Session-establishment shape.
    ///
    /// For a registered hostname the returned request carries no hostname
    /// and no hostname check; otherwise `request` comes back unchanged.
    pub fn establish_session(&self, request: SessionRequest) -> SessionRequest {
        let decision = self.decide(request.server_hostname.as_deref());
        if !decision.is_suppressed() {
            return request;
        }

        tracing::debug!(
            host = ?request.server_hostname,
            "suppressing SNI for protected host"
        );
        SessionRequest {
            server_side: request.server_side,
            server_hostname: None,
            check_hostname: request.check_hostname && !decision.skip_hostname_fast_verify,
        }
    }

    /// Explicit-set shape.
    ///
    /// Forwards `name` to `sink` exactly once unless it names a registered
    /// host, in which case the sink is never called. `name` must be UTF-8.
    pub fn set_server_name<S>(&self, sink: &mut S, name: &[u8]) -> Result<(), NetError>
    where
        S: ServerNameSink + ?Sized,
    {
        let name = std::str::from_utf8(name).map_err(|_| NetError::InvalidUrl)?;
        if self.decide(Some(name)).is_suppressed() {
            tracing::debug!(host = %name, "dropping explicit SNI for protected host");
            return Ok(());
        }
        sink.set_server_name(name)
    }
}
