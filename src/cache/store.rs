//! In-process TTL cache for response envelopes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// A thread-safe key/value cache with per-entry TTL.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<DashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    /// Fetch a live entry. Expired entries are removed on access.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();
        let hit = self
            .inner
            .get(key)
            .and_then(|entry| (entry.expires_at > now).then(|| entry.value.clone()));

        if hit.is_none() {
            self.inner.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Insert or replace an entry. At capacity, expired entries are purged
    /// first, then the live entries closest to expiry are evicted.
    pub fn set(&self, key: impl Into<String>, value: serde_json::Value, ttl: Duration) {
        if self.max_entries == 0 {
            return;
        }
        let key = key.into();
        if !self.inner.contains_key(&key) && self.inner.len() >= self.max_entries {
            self.purge_expired();
            if self.inner.len() >= self.max_entries {
                // Down to 90% of capacity.
                let target = self.max_entries - (self.max_entries / 10).max(1);
                self.evict_soonest_expiring(self.inner.len().saturating_sub(target));
            }
        }
        self.inner.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.inner.len();
        let now = Instant::now();
        self.inner.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.inner.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.inner.len(), "Purged expired cache entries");
        }
        removed
    }

    fn evict_soonest_expiring(&self, count: usize) {
        let mut entries: Vec<(String, Instant)> = self
            .inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().expires_at))
            .collect();
        entries.sort_unstable_by_key(|(_, expires_at)| *expires_at);

        for (key, _) in entries.into_iter().take(count) {
            self.inner.remove(&key);
        }
        tracing::debug!(evicted = count, remaining = self.inner.len(), "Evicted live cache entries");
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
