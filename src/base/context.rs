//! Ergonomic error context helpers.
//!
//! Extension traits that turn IO and timer failures into context-rich
//! `NetError` variants at the point where the host is known.

use crate::base::neterror::NetError;
use std::io;
use tokio::time::error::Elapsed;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use sniveil::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context("example.com", 443)?;
    /// // Error: "Connection to example.com:443 failed: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Add DNS resolution context to an IO error.
    fn dns_context(self, domain: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| NetError::connection_failed_to(host, port, e))
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }
}

/// Maps `tokio::time::timeout` expiry onto the matching `NetError`.
pub trait TimeoutResultExt<T> {
    /// Expiry while talking to a DNS-over-HTTPS server.
    fn dns_timeout(self) -> Result<T, NetError>;

    /// Expiry while connecting or waiting for a response.
    fn connect_timeout(self) -> Result<T, NetError>;
}

impl<T> TimeoutResultExt<T> for Result<Result<T, NetError>, Elapsed> {
    fn dns_timeout(self) -> Result<T, NetError> {
        self.map_err(|_| NetError::DnsTimedOut)?
    }

    fn connect_timeout(self) -> Result<T, NetError> {
        self.map_err(|_| NetError::ConnectionTimedOut)?
    }
}
