//! Interception context: the state shared by DoH resolution and SNI
//! suppression.
//!
//! A context owns one [`HostRegistry`], one [`ResolutionCache`] and one
//! [`DohResolver`]. Clients built with the same context share all three;
//! separate contexts never see each other's hosts or cached answers.

use crate::base::neterror::NetError;
use crate::dns::{
    DohConfig, DohResolver, DohTransport, HostRegistry, ResolutionCache, ResolutionDispatcher,
    Resolve,
};
use crate::tls::SniSuppressor;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct InterceptionContext {
    hosts: HostRegistry,
    cache: ResolutionCache,
    doh: Arc<DohResolver>,
}

impl InterceptionContext {
    /// Context querying `config.endpoint` over HTTPS, with the endpoint
    /// itself resolved by `getaddrinfo`.
    pub fn new(config: DohConfig) -> Result<Self, NetError> {
        Ok(Self::with_resolver(DohResolver::with_https(config)?))
    }

    /// Context using `transport` for DoH queries.
    pub fn with_transport(config: DohConfig, transport: Arc<dyn DohTransport>) -> Self {
        Self::with_resolver(DohResolver::new(config, transport))
    }

    fn with_resolver(doh: DohResolver) -> Self {
        Self {
            hosts: HostRegistry::new(),
            cache: ResolutionCache::new(),
            doh: Arc::new(doh),
        }
    }

    /// Registers protected hosts. Additive and case-insensitive.
    pub fn add_hosts<I, S>(&self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.hosts.add_hosts(hosts);
    }

    pub fn is_protected(&self, host: &str) -> bool {
        self.hosts.is_protected(host)
    }

    pub fn hosts(&self) -> &HostRegistry {
        &self.hosts
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn doh(&self) -> &DohResolver {
        &self.doh
    }

    /// Resolver routing protected hosts through the cache and DoH, and
    /// everything else through `native`.
    pub fn dispatcher(&self, native: Arc<dyn Resolve>) -> ResolutionDispatcher {
        ResolutionDispatcher::new(
            native,
            self.hosts.clone(),
            self.cache.clone(),
            self.doh.clone(),
        )
    }

    pub fn sni_suppressor(&self) -> SniSuppressor {
        SniSuppressor::new(self.hosts.clone())
    }
}
