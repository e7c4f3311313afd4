//! In-memory cache with per-cache TTL and a bounded entry count

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Cache entry with insertion time for TTL and eviction ordering
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Instant,
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired_entries: u64,
    pub total_entries: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0.0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

/// Named in-memory cache
///
/// Entries expire `ttl` after insertion. When `max_entries` is reached, expired
/// entries are purged first and then the oldest entry is evicted.
#[derive(Debug)]
pub struct MemoryCache<V> {
    name: &'static str,
    ttl: Duration,
    max_entries: usize,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone + Send> MemoryCache<V> {
    pub fn new(name: &'static str, ttl: Duration, max_entries: usize) -> Self {
        Self {
            name,
            ttl,
            max_entries: max_entries.max(1),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Look up a live entry, recording a hit or a miss
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Instant::now();

        let expired = match state.entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                let value = entry.value.clone();
                state.stats.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            state.entries.remove(key);
            state.stats.expired_entries += 1;
        }
        state.stats.misses += 1;
        None
    }

    /// Store a value, replacing any previous entry for `key`
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
            Self::purge_expired(&mut state, now);
            if state.entries.len() >= self.max_entries {
                Self::evict_oldest(&mut state);
                debug!(cache = self.name, "Evicted oldest cache entry");
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Remove and return a live entry without touching hit/miss counters
    pub async fn take(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state
            .entries
            .remove(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value)
    }

    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
    }

    /// Drop expired entries, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut state = self.state.lock().await;
        Self::purge_expired(&mut state, Instant::now())
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            total_entries: state.entries.len() as u64,
            ..state.stats.clone()
        }
    }

    fn purge_expired(state: &mut CacheState<V>, now: Instant) -> usize {
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - state.entries.len();
        state.stats.expired_entries += removed as u64;
        removed
    }

    fn evict_oldest(state: &mut CacheState<V>) {
        let oldest = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            state.entries.remove(&key);
            state.stats.evictions += 1;
        }
    }
}
