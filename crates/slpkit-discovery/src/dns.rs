//! Reverse DNS resolution with a per-address cache.

use async_trait::async_trait;
use dashmap::DashMap;
use hickory_resolver::TokioAsyncResolver;
use slpkit_core::{Result, SlpError};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Backend performing a single reverse lookup
#[async_trait]
pub trait ReverseLookup: Send + Sync {
    /// Returns the name registered for `ip`, or an error if there is none
    async fn reverse_lookup(&self, ip: IpAddr) -> anyhow::Result<String>;
}

/// Reverse lookups through the system resolver configuration
pub struct SystemReverseLookup {
    resolver: TokioAsyncResolver,
}

impl SystemReverseLookup {
    /// Creates a resolver from `/etc/resolv.conf` (or the platform equivalent)
    pub fn from_system_conf() -> Result<Self> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().map_err(|e| {
            SlpError::Io(std::io::Error::other(format!(
                "Failed to load system resolver configuration: {}",
                e
            )))
        })?;
        Ok(Self { resolver })
    }
}

#[async_trait]
impl ReverseLookup for SystemReverseLookup {
    async fn reverse_lookup(&self, ip: IpAddr) -> anyhow::Result<String> {
        let names = self.resolver.reverse_lookup(ip).await?;
        let name = names
            .iter()
            .next()
            .map(|name| name.to_string())
            .ok_or_else(|| anyhow::anyhow!("no PTR record for {}", ip))?;
        Ok(name.trim_end_matches('.').to_string())
    }
}

/// Hostnames keyed by IP address.
///
/// Only successful lookups are stored. Entries are never evicted; the
/// cache is bounded by the number of distinct addresses seen. Clones share
/// the same storage.
#[derive(Debug, Clone, Default)]
pub struct DnsCache {
    entries: Arc<DashMap<String, String>>,
}

impl DnsCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached hostname for `ip`
    pub fn get(&self, ip: &str) -> Option<String> {
        self.entries.get(ip).map(|entry| entry.value().clone())
    }

    /// Stores `host` for `ip` unless another writer got there first, and
    /// returns the stored name.
    pub fn insert(&self, ip: &str, host: String) -> String {
        self.entries
            .entry(ip.to_string())
            .or_insert(host)
            .value()
            .clone()
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.entries.contains_key(ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Caching reverse resolver used when building services.
///
/// Lookups for the same address are serialized: miss, lookup and insert
/// run under a per-address lock, so concurrent callers wait for the first
/// lookup and then read its answer from the cache.
#[derive(Clone)]
pub struct DnsResolver {
    cache: DnsCache,
    backend: Option<Arc<dyn ReverseLookup>>,
    in_flight: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl DnsResolver {
    /// Creates a resolver with a fresh cache
    pub fn new(backend: Arc<dyn ReverseLookup>) -> Self {
        Self::with_cache(backend, DnsCache::new())
    }

    /// Creates a resolver sharing an existing cache
    pub fn with_cache(backend: Arc<dyn ReverseLookup>, cache: DnsCache) -> Self {
        Self {
            cache,
            backend: Some(backend),
            in_flight: Arc::default(),
        }
    }

    /// Creates a resolver backed by the system resolver configuration
    pub fn system() -> Result<Self> {
        Ok(Self::new(Arc::new(SystemReverseLookup::from_system_conf()?)))
    }

    /// Creates a resolver that never performs lookups
    pub fn disabled() -> Self {
        Self {
            cache: DnsCache::new(),
            backend: None,
            in_flight: Arc::default(),
        }
    }

    /// The cache backing this resolver
    pub fn cache(&self) -> &DnsCache {
        &self.cache
    }

    /// Resolves `ip` to a hostname.
    ///
    /// Cached names are returned without a lookup. Failures of any kind
    /// yield `None` and are not cached, so the next call tries again.
    pub async fn resolve(&self, ip: &str) -> Option<String> {
        if let Some(host) = self.cache.get(ip) {
            debug!(ip, host = %host, "DNS cache hit");
            return Some(host);
        }

        let backend = self.backend.as_ref()?;

        let addr: IpAddr = match ip.parse() {
            Ok(addr) => addr,
            Err(_) => {
                debug!(ip, "Not an IP address, skipping reverse lookup");
                return None;
            }
        };

        let lock = self.in_flight.entry(ip.to_string()).or_default().clone();
        let _guard = lock.lock().await;

        // Another caller may have resolved it while we waited
        if let Some(host) = self.cache.get(ip) {
            debug!(ip, host = %host, "DNS cache hit after wait");
            return Some(host);
        }

        match backend.reverse_lookup(addr).await {
            Ok(host) => {
                debug!(ip, host = %host, "Resolved hostname");
                Some(self.cache.insert(ip, host))
            }
            Err(e) => {
                debug!(ip, error = %e, "Reverse lookup failed");
                None
            }
        }
    }
}
