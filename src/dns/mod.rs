//! DNS Resolution Module
//!
//! Provides pluggable, getaddrinfo-shaped DNS resolution:
//! - System resolver (getaddrinfo via thread pool)
//! - Async hickory-dns resolver
//! - DNS-over-HTTPS resolver for protected hosts, with a TTL-bounded cache
//! - A dispatcher that picks one of the above per host
//!
//! # Architecture
//!
//! This module mirrors Chromium's `HostResolver` concept. The `Resolve`
//! trait is the core abstraction; [`ResolutionDispatcher`] implements it
//! by delegating to a native resolver for ordinary hosts and to
//! [`ResolutionCache`] plus [`DohResolver`] for hosts in a
//! [`HostRegistry`].
//!
//! # Example
//!
//! ```rust,ignore
//! use sniveil::dns::{AddrInfoHints, GaiResolver, Name, Resolve};
//!
//! let resolver = GaiResolver::new();
//! let infos = resolver
//!     .resolve(Name::new("example.com"), 443, AddrInfoHints::stream())
//!     .await?;
//! for info in infos {
//!     println!("Resolved: {}", info.addr);
//! }
//! ```

mod addrinfo;
mod cache;
mod dispatch;
pub mod doh;
mod gai;
mod hickory;
mod hosts;
mod resolve;

pub use addrinfo::{AddrInfo, AddrInfoHints, AddressFamily, Protocol, SocketKind};
pub use cache::{CacheEntry, ResolutionCache};
pub use dispatch::ResolutionDispatcher;
pub use doh::{
    parse_dns_json, DohAnswer, DohConfig, DohConfigBuilder, DohResolver, DohTransport,
    HttpsTransport, RecordType,
};
pub use gai::{GaiResolver, SocketAddrs};
pub use hickory::HickoryResolver;
pub use hosts::HostRegistry;
pub use resolve::{Name, Resolve, Resolving};
