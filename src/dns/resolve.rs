//! Core DNS resolution types and traits.
//!
//! This module defines the `Resolve` trait and supporting types that form
//! the foundation of the DNS abstraction layer.

use super::addrinfo::{AddrInfo, AddrInfoHints};
use crate::base::neterror::NetError;
use std::{fmt, future::Future, pin::Pin, sync::Arc};

/// A domain name to resolve into IP addresses.
///
/// This is a lightweight wrapper around a hostname string that provides
/// a type-safe way to pass domain names to resolvers.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Alias for the `Future` type returned by a DNS resolver.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Vec<AddrInfo>, NetError>> + Send>>;

/// Trait for DNS resolution.
///
/// The getaddrinfo-shaped strategy every connect path resolves through.
/// Implementations must be thread-safe.
///
/// # Design Notes
///
/// - `port`, socket kind and protocol are copied into every returned entry.
/// - `hints.family` filters the result; `Unspec` admits both families.
/// - An empty `Ok` means "no addresses found" and is not an error here;
///   the connect path turns it into `NameNotResolvedFor`.
pub trait Resolve: Send + Sync {
    /// Resolves a domain name to address-info entries.
    fn resolve(&self, name: Name, port: u16, hints: AddrInfoHints) -> Resolving;
}

/// Blanket implementation for Arc-wrapped resolvers.
impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name, port: u16, hints: AddrInfoHints) -> Resolving {
        (**self).resolve(name, port, hints)
    }
}
