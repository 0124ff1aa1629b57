//! Data loading with freshness caches.
//!
//! [`DataLoader`] sits between route search and a [`DataSource`]. Static
//! catalog rows change rarely and are kept for a long window; dynamic rows
//! are keyed by collection set and link filter and kept only briefly, since
//! collections are edited constantly.

use std::sync::Arc;
use std::time::Duration;

use jumpgate_core::{CollectionIds, GraphStore, JumpRow, LinkFilterSpec};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::traits::{CacheStore, DataSource};

/// Cache key of the static row set.
const STATIC_ROWS_KEY: &str = "jump_rows_static";

/// Prefix of dynamic row set keys.
const DYNAMIC_ROWS_PREFIX: &str = "jump_rows_dynamic_";

/// Default static freshness window (24h).
pub const DEFAULT_STATIC_TTL: Duration = Duration::from_secs(86_400);

/// Default dynamic freshness window.
pub const DEFAULT_DYNAMIC_TTL: Duration = Duration::from_secs(10);

/// Loads jump rows through a shared cache.
#[derive(Clone)]
pub struct DataLoader {
    source: Arc<dyn DataSource>,
    cache: Arc<dyn CacheStore>,
    static_ttl: Duration,
    dynamic_ttl: Duration,
}

impl DataLoader {
    pub fn new(source: Arc<dyn DataSource>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            source,
            cache,
            static_ttl: DEFAULT_STATIC_TTL,
            dynamic_ttl: DEFAULT_DYNAMIC_TTL,
        }
    }

    /// Set both freshness windows.
    pub fn with_ttls(mut self, static_ttl: Duration, dynamic_ttl: Duration) -> Self {
        self.static_ttl = static_ttl;
        self.dynamic_ttl = dynamic_ttl;
        self
    }

    /// Static catalog rows.
    pub async fn load_static(&self) -> Result<Vec<JumpRow>, BackendError> {
        if let Some(rows) = self.cached(STATIC_ROWS_KEY) {
            debug!("Static rows from cache ({})", rows.len());
            return Ok(rows);
        }

        let rows = self.source.load_static().await?;
        debug!("Loaded {} static rows", rows.len());
        self.store(STATIC_ROWS_KEY, &rows, self.static_ttl);
        Ok(rows)
    }

    /// Dynamic rows of `collections` under `filter`.
    ///
    /// Yields nothing without collections or without a selected link scope;
    /// the data source is not consulted in that case.
    pub async fn load_dynamic(
        &self,
        collections: &CollectionIds,
        filter: &LinkFilterSpec,
    ) -> Result<Vec<JumpRow>, BackendError> {
        let predicate = filter.predicate();
        if collections.is_empty() || predicate.is_empty() {
            return Ok(Vec::new());
        }

        let key = dynamic_key(collections, filter);
        if let Some(rows) = self.cached(&key) {
            debug!("Dynamic rows from cache ({})", rows.len());
            return Ok(rows);
        }

        let rows = self.source.load_dynamic(collections, &predicate).await?;
        debug!(
            "Loaded {} dynamic rows for collections {:?}",
            rows.len(),
            collections.to_vec()
        );
        self.store(&key, &rows, self.dynamic_ttl);
        Ok(rows)
    }

    /// Merge dynamic rows into `graph`.
    pub async fn merge_dynamic(
        &self,
        graph: &mut GraphStore,
        collections: &CollectionIds,
        filter: &LinkFilterSpec,
    ) -> Result<(), BackendError> {
        let rows = self.load_dynamic(collections, filter).await?;
        graph.merge_rows(&rows);
        Ok(())
    }

    /// Merge static rows into `graph`.
    pub async fn merge_static(&self, graph: &mut GraphStore) -> Result<(), BackendError> {
        let rows = self.load_static().await?;
        graph.merge_rows(&rows);
        Ok(())
    }

    fn cached(&self, key: &str) -> Option<Vec<JumpRow>> {
        let value = self.cache.get(key)?;
        match serde_json::from_value(value) {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!("Ignoring unreadable row cache entry {}: {}", key, e);
                None
            }
        }
    }

    fn store(&self, key: &str, rows: &[JumpRow], ttl: Duration) {
        match serde_json::to_value(rows) {
            Ok(value) => self.cache.set(key, value, ttl),
            Err(e) => warn!("Could not cache rows under {}: {}", key, e),
        }
    }
}

/// Key covering the collection set and every link flag (not the security
/// mode, which does not affect rows).
fn dynamic_key(collections: &CollectionIds, filter: &LinkFilterSpec) -> String {
    let mut hasher = Sha256::new();
    for id in collections.iter() {
        hasher.update(id.to_string().as_bytes());
        hasher.update(b",");
    }
    let flags = filter.key_parts();
    for part in &flags[..flags.len() - 1] {
        hasher.update(part.as_bytes());
    }
    let hex: String = hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    format!("{DYNAMIC_ROWS_PREFIX}{hex}")
}
