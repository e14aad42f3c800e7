//! Resolution dispatcher.
//!
//! Routes each lookup either to the native resolver or, for protected
//! hosts, through the resolution cache and the DoH resolver.

use super::addrinfo::{AddrInfo, AddrInfoHints, AddressFamily};
use super::cache::ResolutionCache;
use super::doh::DohResolver;
use super::hosts::HostRegistry;
use super::{Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// The resolver installed on a client.
///
/// Unprotected hosts and the DoH endpoint's own host are handed to the
/// native resolver untouched, errors included. Protected hosts never reach
/// it: they are answered from the cache, or from a fresh DoH query on a
/// miss. A failed DoH query degrades to an empty result.
#[derive(Clone)]
pub struct ResolutionDispatcher {
    native: Arc<dyn Resolve>,
    hosts: HostRegistry,
    cache: ResolutionCache,
    doh: Arc<DohResolver>,
}

impl ResolutionDispatcher {
    pub fn new(
        native: Arc<dyn Resolve>,
        hosts: HostRegistry,
        cache: ResolutionCache,
        doh: Arc<DohResolver>,
    ) -> Self {
        Self {
            native,
            hosts,
            cache,
            doh,
        }
    }

    /// Whether a lookup for `host` takes the DoH path.
    pub fn routes_via_doh(&self, host: &str) -> bool {
        self.hosts.is_protected(host) && !self.doh.is_endpoint(host)
    }

    /// Resolves `host`, choosing the path per host.
    pub async fn resolve_addresses(
        &self,
        host: &str,
        port: u16,
        hints: AddrInfoHints,
    ) -> Result<Vec<AddrInfo>, NetError> {
        if !self.routes_via_doh(host) {
            return self.native.resolve(Name::new(host), port, hints).await;
        }

        let cached = self.cache.get_addresses(host);
        if !cached.is_empty() {
            tracing::debug!(host = %host, count = cached.len(), "resolution cache hit");
            return Ok(synthesize(host, &cached, port, &hints));
        }

        match self.doh.resolve(host).await {
            Ok(answer) => {
                tracing::debug!(host = %host, count = answer.len(), "resolved via DoH");
                self.cache.update(host, answer.addresses.as_slice(), &answer.ttls);
                Ok(synthesize(host, &answer.addresses, port, &hints))
            }
            Err(e) => {
                // Falling back to the native resolver would hand the
                // lookup to the poisoned path.
                tracing::warn!(host = %host, error = %e, "DoH resolution failed");
                Ok(Vec::new())
            }
        }
    }
}

impl Resolve for ResolutionDispatcher {
    fn resolve(&self, name: Name, port: u16, hints: AddrInfoHints) -> Resolving {
        let dispatcher = self.clone();
        Box::pin(async move {
            dispatcher
                .resolve_addresses(name.as_str(), port, hints)
                .await
        })
    }
}

impl fmt::Debug for ResolutionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionDispatcher")
            .field("hosts", &self.hosts.len())
            .field("cache", &self.cache.len())
            .field("doh", &self.doh)
            .finish_non_exhaustive()
    }
}

/// Turns cached or freshly fetched literals into address-info entries that
/// satisfy `hints`, keeping answer order.
fn synthesize(host: &str, literals: &[String], port: u16, hints: &AddrInfoHints) -> Vec<AddrInfo> {
    literals
        .iter()
        .filter(|literal| hints.family.admits(AddressFamily::of_literal(literal)))
        .filter_map(|literal| match literal.parse::<IpAddr>() {
            Ok(ip) => Some(AddrInfo::new(ip, port, hints)),
            Err(_) => {
                tracing::warn!(host = %host, address = %literal, "ignoring unparsable cached address");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::addrinfo::{Protocol, SocketKind};

    fn literals(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_synthesize_copies_hints() {
        let hints = AddrInfoHints::stream();
        let infos = synthesize("h", &literals(&["1.2.3.4"]), 443, &hints);

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].family, AddressFamily::Inet);
        assert_eq!(infos[0].socket_kind, SocketKind::Stream);
        assert_eq!(infos[0].protocol, Protocol::Tcp);
        assert!(infos[0].canonical_name.is_empty());
        assert_eq!(infos[0].addr.to_string(), "1.2.3.4:443");
    }

    #[test]
    fn test_synthesize_filters_family() {
        let mixed = literals(&["1.2.3.4", "2001:db8::1", "5.6.7.8"]);

        let v4_hints = AddrInfoHints::stream().with_family(AddressFamily::Inet);
        let v4 = synthesize("h", &mixed, 80, &v4_hints);
        assert_eq!(v4.len(), 2);

        let v6_hints = AddrInfoHints::stream().with_family(AddressFamily::Inet6);
        let v6 = synthesize("h", &mixed, 80, &v6_hints);
        assert_eq!(v6.len(), 1);
        assert_eq!(v6[0].addr.to_string(), "[2001:db8::1]:80");

        let any = synthesize("h", &mixed, 80, &AddrInfoHints::stream());
        assert_eq!(any.len(), 3);
    }

    #[test]
    fn test_synthesize_skips_garbage() {
        let mixed = literals(&["not-an-ip", "10.0.0.1"]);
        let infos = synthesize("h", &mixed, 80, &AddrInfoHints::default());
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].addr.to_string(), "10.0.0.1:80");
    }
}
