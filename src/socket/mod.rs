//! Socket and connection management.
//!
//! Mirrors the shape of Chromium's `net/socket/`:
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`tls`]: TLS configuration and SNI-aware handshakes with BoringSSL
//! - [`client`]: the connected socket type

pub mod client;
pub mod connectjob;
pub mod tls;
