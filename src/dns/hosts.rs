//! Registry of protected hostnames.
//!
//! Entries are folded to lower case on insertion and every membership test
//! folds its query the same way. Entries are never removed.

use dashmap::DashSet;
use std::sync::Arc;

/// Thread-safe, case-insensitive set of protected hostnames.
///
/// Cloning is cheap and clones share the same underlying set, the same way
/// [`ResolutionCache`](super::ResolutionCache) clones share their entries.
#[derive(Clone, Debug, Default)]
pub struct HostRegistry {
    hosts: Arc<DashSet<String>>,
}

impl HostRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every host, lower-cased. Re-adding a host is a no-op.
    pub fn add_hosts<I, S>(&self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for host in hosts {
            let host = host.as_ref().to_lowercase();
            if self.hosts.insert(host.clone()) {
                tracing::debug!(host = %host, "registered protected host");
            }
        }
    }

    /// Whether `host` (in any letter case) is registered.
    pub fn is_protected(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_lowercase())
    }

    /// Number of registered hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns true if no host is registered.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
