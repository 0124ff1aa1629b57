//! Route and data caching.
//!
//! [`MemoryCacheStore`] is an in-process [`CacheStore`]: an LRU map of JSON
//! snapshots with per-entry expiry, thread-safe via `parking_lot::Mutex`.
//! [`RouteCache`] derives deterministic keys for route searches and stores
//! only successful results.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jumpgate_core::{CollectionIds, LinkFilterSpec};
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::traits::CacheStore;
use crate::types::{Endpoint, RouteResult};

/// Default capacity of [`MemoryCacheStore`].
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Namespace prefix of route cache keys.
const ROUTE_KEY_PREFIX: &str = "route_";

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Lookups answered from a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries dropped because their lifetime ran out
    pub expirations: u64,
    /// Entries written
    pub stores: u64,
}

impl CacheMetrics {
    /// Get hit rate as a fraction (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Inner state for MemoryCacheStore (protected by Mutex)
struct CacheState {
    entries: LruCache<String, Entry>,
    metrics: CacheMetrics,
}

/// In-memory LRU cache store with per-entry lifetimes.
///
/// Expired entries are evicted lazily when read. When full, the least
/// recently used entry makes room for a new one.
pub struct MemoryCacheStore {
    state: Mutex<CacheState>,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl MemoryCacheStore {
    /// Create a store holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                metrics: CacheMetrics::default(),
            }),
        }
    }

    /// Number of entries held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a snapshot of cache metrics
    pub fn metrics(&self) -> CacheMetrics {
        self.state.lock().metrics.clone()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = Instant::now();

        let live = match state.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                state.metrics.misses += 1;
                return None;
            }
        };

        match live {
            Some(value) => {
                state.metrics.hits += 1;
                Some(value)
            }
            None => {
                state.entries.pop(key);
                state.metrics.expirations += 1;
                state.metrics.misses += 1;
                trace!("Cache entry '{}' expired", key);
                None
            }
        }
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let mut state = self.state.lock();
        state.entries.put(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        state.metrics.stores += 1;
    }
}

/// Route result cache over a shared [`CacheStore`].
#[derive(Clone)]
pub struct RouteCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl RouteCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Deterministic key for a search.
    ///
    /// Collection ids are taken in ascending order and endpoint names are
    /// compared case- and whitespace-insensitively, so logically equal
    /// searches share a key. Endpoint system ids are part of the key since
    /// names are optional on the wire.
    pub fn key(
        collections: &CollectionIds,
        from: &Endpoint,
        to: &Endpoint,
        filter: &LinkFilterSpec,
    ) -> String {
        let ids: Vec<String> = collections.iter().map(|id| id.to_string()).collect();

        let mut parts = vec![
            ids.join(","),
            from.system_id.to_string(),
            name_key(&from.name),
            to.system_id.to_string(),
            name_key(&to.name),
        ];
        parts.extend(filter.key_parts());

        // length-prefixed, so no part can run into the next
        let mut hasher = Sha256::new();
        for part in &parts {
            hasher.update(part.len().to_string().as_bytes());
            hasher.update(b":");
            hasher.update(part.as_bytes());
        }
        let hex: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        format!("{ROUTE_KEY_PREFIX}{hex}")
    }

    /// Cached result for `key`, if one is live.
    pub fn get(&self, key: &str) -> Option<RouteResult> {
        let value = self.store.get(key)?;
        match serde_json::from_value(value) {
            Ok(result) => {
                debug!("Route cache hit for {}", key);
                Some(result)
            }
            Err(e) => {
                warn!("Discarding unreadable route cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Store `result` under `key` if it found a route. Returns whether it
    /// was stored.
    pub fn put(&self, key: &str, result: &RouteResult) -> bool {
        if !result.found {
            return false;
        }

        match serde_json::to_value(result) {
            Ok(value) => {
                self.store.set(key, value, self.ttl);
                debug!("Cached route under {} for {:?}", key, self.ttl);
                true
            }
            Err(e) => {
                warn!("Could not cache route {}: {}", key, e);
                false
            }
        }
    }
}

/// Lower-cased name with all whitespace removed.
fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PathEntry, SearchType};
    use jumpgate_core::SecurityMode;
    use pretty_assertions::assert_eq;

    fn found_route() -> RouteResult {
        RouteResult {
            found: true,
            jump_count: 1,
            max_depth: 7000,
            depth_searched: 0,
            search_type: SearchType::Local,
            path: vec![
                PathEntry {
                    name: "JITA".into(),
                    security: Some(0.946),
                },
                PathEntry {
                    name: "PERIMETER".into(),
                    security: Some(0.9),
                },
            ],
            error: None,
        }
    }

    #[test]
    fn test_store_get_set() {
        let store = MemoryCacheStore::new(8);
        assert!(store.get("a").is_none());

        store.set("a", serde_json::json!({"x": 1}), Duration::from_secs(60));
        assert_eq!(store.get("a"), Some(serde_json::json!({"x": 1})));

        let metrics = store.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.stores, 1);
        assert_eq!(metrics.hit_rate(), 0.5);
    }

    #[test]
    fn test_store_expiry() {
        let store = MemoryCacheStore::new(8);
        store.set("a", serde_json::json!(1), Duration::ZERO);

        assert!(store.get("a").is_none());
        assert!(store.is_empty());
        assert_eq!(store.metrics().expirations, 1);
    }

    #[test]
    fn test_store_last_writer_wins() {
        let store = MemoryCacheStore::new(8);
        store.set("k", serde_json::json!("first"), Duration::from_secs(60));
        store.set("k", serde_json::json!("second"), Duration::from_secs(60));
        assert_eq!(store.get("k"), Some(serde_json::json!("second")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_evicts_least_recent() {
        let store = MemoryCacheStore::new(2);
        let ttl = Duration::from_secs(60);
        store.set("a", serde_json::json!(1), ttl);
        store.set("b", serde_json::json!(2), ttl);
        let _ = store.get("a");
        store.set("c", serde_json::json!(3), ttl);

        assert!(store.get("b").is_none());
        assert!(store.get("a").is_some());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_zero_capacity_still_usable() {
        let store = MemoryCacheStore::new(0);
        store.set("a", serde_json::json!(1), Duration::from_secs(60));
        assert!(store.get("a").is_some());
    }

    fn endpoint(name: &str, system_id: u64) -> Endpoint {
        Endpoint::new(name, system_id)
    }

    #[test]
    fn test_key_is_order_and_case_insensitive() {
        let filter = LinkFilterSpec {
            stargates: true,
            ..Default::default()
        };
        let a = RouteCache::key(
            &CollectionIds::from_raw([3, 1]),
            &endpoint("Jita", 30000142),
            &endpoint("Amarr", 30002187),
            &filter,
        );
        let b = RouteCache::key(
            &CollectionIds::from_raw([1, 3, 3]),
            &endpoint(" jita ", 30000142),
            &endpoint("AMARR", 30002187),
            &filter,
        );

        assert_eq!(a, b);
        assert!(a.starts_with("route_"));
        assert_eq!(a.len(), "route_".len() + 64);
    }

    #[test]
    fn test_key_depends_on_filter() {
        let ids = CollectionIds::from_raw([1]);
        let (a, b) = (endpoint("A", 1), endpoint("B", 2));
        let base = LinkFilterSpec::default();
        let secure = LinkFilterSpec {
            flag: SecurityMode::Secure,
            ..Default::default()
        };
        let holes = LinkFilterSpec {
            wormholes: true,
            ..Default::default()
        };

        let k0 = RouteCache::key(&ids, &a, &b, &base);
        assert_ne!(k0, RouteCache::key(&ids, &a, &b, &secure));
        assert_ne!(k0, RouteCache::key(&ids, &a, &b, &holes));
        assert_ne!(k0, RouteCache::key(&ids, &b, &a, &base));
    }

    #[test]
    fn test_key_depends_on_system_ids() {
        let ids = CollectionIds::from_raw([1]);
        let filter = LinkFilterSpec::default();

        let to_three = RouteCache::key(&ids, &endpoint("", 1), &endpoint("", 3), &filter);
        let to_four = RouteCache::key(&ids, &endpoint("", 1), &endpoint("", 4), &filter);
        assert_ne!(to_three, to_four);
    }

    #[test]
    fn test_key_parts_do_not_run_together() {
        let ids = CollectionIds::from_raw([1]);
        let filter = LinkFilterSpec::default();

        let a = RouteCache::key(&ids, &endpoint("a_b", 1), &endpoint("c", 2), &filter);
        let b = RouteCache::key(&ids, &endpoint("a", 1), &endpoint("b_c", 2), &filter);
        assert_ne!(a, b);
    }

    #[test]
    fn test_route_cache_only_stores_found() {
        let cache = RouteCache::new(Arc::new(MemoryCacheStore::new(8)), Duration::from_secs(10));

        let miss = RouteResult::new(SearchType::Local, 7000);
        assert!(!cache.put("k", &miss));
        assert!(cache.get("k").is_none());

        let hit = found_route();
        assert!(cache.put("k", &hit));
        assert_eq!(cache.get("k"), Some(hit));
    }

    #[test]
    fn test_route_cache_expires() {
        let cache = RouteCache::new(Arc::new(MemoryCacheStore::new(8)), Duration::ZERO);
        assert!(cache.put("k", &found_route()));
        assert!(cache.get("k").is_none());
    }
}
