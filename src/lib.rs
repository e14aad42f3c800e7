//! # sniveil
//!
//! DNS-over-HTTPS resolution and SNI suppression for an explicit list of
//! protected hosts, built into a small HTTP/1.1 client.
//!
//! For a protected host the client:
//! - resolves the name through a DoH endpoint (with a TTL-bounded cache)
//!   instead of the local, possibly poisoned, resolver;
//! - omits the Server Name Indication from the TLS ClientHello, while still
//!   verifying the certificate against the real hostname.
//!
//! Every other host goes through the native resolver and a normal
//! handshake, untouched.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sniveil::{Client, DohConfig, InterceptionContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sniveil::NetError> {
//!     let ctx = InterceptionContext::new(DohConfig::default())?;
//!     ctx.add_hosts(["www.pixiv.net"]);
//!
//!     let client = Client::builder().interception(ctx).build()?;
//!     let response = client.get("https://www.pixiv.net/").send().await?;
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and context helpers
//! - [`dns`] - Resolvers, DoH, the resolution cache and the dispatcher
//! - [`tls`] - SNI suppression decisions
//! - [`socket`] - Connect flow and BoringSSL connector
//! - [`http`] - HTTP/1.1 streams and responses
//! - [`interception`] - The shared interception state
//! - [`config`] - JSON configuration

pub mod base;
pub mod client;
pub mod config;
pub mod dns;
pub mod http;
pub mod interception;
pub mod socket;
pub mod tls;

pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder, RequestBuilder};
pub use config::InterceptionConfig;
pub use dns::{DohConfig, RecordType};
pub use interception::InterceptionContext;
