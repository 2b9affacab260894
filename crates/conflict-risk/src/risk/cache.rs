//! Read-through cache fronting the risk store.
//!
//! Entries are written once and expire purely by age; there is no invalidation protocol.
//! Expired entries are reclaimed when they are next read and whenever anything is inserted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::config::CacheConfig;

/// Query families with their own freshness requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryClass {
    /// Volatile fleet-wide aggregates (heatmap, alerts, tier statistics).
    Fleet,
    /// Slowly-changing per-entity history.
    History,
}

impl QueryClass {
    pub fn ttl(self, config: &CacheConfig) -> Duration {
        match self {
            QueryClass::Fleet => config.fleet_ttl,
            QueryClass::History => config.history_ttl,
        }
    }
}

/// Request shape used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub class: QueryClass,
    pub shape: String,
}

impl CacheKey {
    pub fn new(class: QueryClass, shape: impl Into<String>) -> Self {
        Self {
            class,
            shape: shape.into(),
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct TtlCache<V> {
    config: CacheConfig,
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
    stats: RwLock<CacheStats>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(CacheConfig::disabled())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        self.get_at(key, Instant::now()).await
    }

    pub(crate) async fn get_at(&self, key: &CacheKey, now: Instant) -> Option<V> {
        if !self.config.enabled {
            return None;
        }

        let (hit, stale) = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => (Some(entry.value.clone()), false),
                Some(_) => (None, true),
                None => (None, false),
            }
        };

        if stale {
            let mut entries = self.entries.write().await;
            // Another writer may have refreshed the slot since the read lock was dropped.
            if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
                entries.remove(key);
            }
        }

        let mut stats = self.stats.write().await;
        if hit.is_some() {
            stats.hits += 1;
            tracing::debug!(shape = %key.shape, "risk cache hit");
        } else {
            stats.misses += 1;
            tracing::debug!(shape = %key.shape, "risk cache miss");
        }
        hit
    }

    /// Stores `value` unless a live entry already exists; the live entry wins.
    pub async fn insert(&self, key: CacheKey, value: V) -> V {
        self.insert_at(key, value, Instant::now()).await
    }

    pub(crate) async fn insert_at(&self, key: CacheKey, value: V, now: Instant) -> V {
        if !self.config.enabled {
            return value;
        }

        let expires_at = now + key.class.ttl(&self.config);
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        match entries.get(&key) {
            Some(existing) if existing.expires_at > now => existing.value.clone(),
            _ => {
                entries.insert(
                    key,
                    CacheEntry {
                        value: value.clone(),
                        expires_at,
                    },
                );
                value
            }
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await.len();
        CacheStats {
            entries,
            ..*self.stats.read().await
        }
    }
}
