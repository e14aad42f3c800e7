//! TTL-bounded cache of DoH answers.
//!
//! Each host maps to the address list from its latest answer. An `update`
//! replaces the whole list; lookups filter out entries whose TTL has run out.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One cached address from a DoH answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Textual IPv4 or IPv6 literal, as the DoH server sent it.
    pub address: String,
    /// Advertised time-to-live.
    pub ttl: Duration,
    /// When the answer was stored.
    pub recorded_at: Instant,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(address: impl Into<String>, ttl_secs: u32) -> Self {
        Self {
            address: address.into(),
            ttl: Duration::from_secs(u64::from(ttl_secs)),
            recorded_at: Instant::now(),
        }
    }

    /// Expired once strictly more than `ttl` has elapsed since recording.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiry check against an explicit point in time.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.recorded_at) > self.ttl
    }
}

/// Thread-safe resolution cache shared by every clone.
///
/// Per-host lists are swapped atomically under the map's shard lock, so a
/// concurrent reader sees either the previous answer or the new one, never
/// a mix.
#[derive(Clone, Debug, Default)]
pub struct ResolutionCache {
    entries: Arc<DashMap<String, Vec<CacheEntry>>>,
}

impl ResolutionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unexpired addresses for `host`, in the order the server sent them.
    ///
    /// Unknown hosts and fully expired answers both yield an empty list.
    pub fn get_addresses(&self, host: &str) -> Vec<String> {
        self.get_addresses_at(host, Instant::now())
    }

    /// [`get_addresses`](Self::get_addresses) evaluated at `now`.
    pub fn get_addresses_at(&self, host: &str, now: Instant) -> Vec<String> {
        let Some(entries) = self.entries.get(&host.to_lowercase()) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.address.clone())
            .collect()
    }

    /// Replace the cached answer for `host` with freshly stamped entries.
    ///
    /// # Panics
    ///
    /// Panics if `addresses` and `ttls` differ in length; a partial answer
    /// is a caller bug.
    pub fn update<S: AsRef<str>>(&self, host: &str, addresses: &[S], ttls: &[u32]) {
        assert_eq!(
            addresses.len(),
            ttls.len(),
            "address and TTL lists must have equal length"
        );

        let recorded_at = Instant::now();
        let fresh: Vec<CacheEntry> = addresses
            .iter()
            .zip(ttls)
            .map(|(address, ttl)| CacheEntry {
                address: address.as_ref().to_string(),
                ttl: Duration::from_secs(u64::from(*ttl)),
                recorded_at,
            })
            .collect();

        let host = host.to_lowercase();
        tracing::trace!(host = %host, count = fresh.len(), "replacing cached answer");
        self.entries.insert(host, fresh);
    }

    /// Number of hosts with a stored answer, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no answer has been stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
