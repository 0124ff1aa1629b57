//! SQLite-backed collaborators.
//!
//! Wraps a [`LinkStore`] behind the async [`DataSource`] and
//! [`AccessControl`] traits. Store calls are blocking and run on the tokio
//! blocking pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use jumpgate_core::{CollectionId, CollectionIds, JumpRow, LinkPredicate, LinkStore};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::BackendError;
use crate::traits::{AccessControl, DataSource};
use crate::types::{Caller, CollectionInfo};

/// Link store shared by data loading and access checks.
#[derive(Clone)]
pub struct SqliteDataSource {
    store: Arc<Mutex<LinkStore>>,
}

impl SqliteDataSource {
    pub fn new(store: LinkStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Open the store at `path` and check its schema version.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let store = LinkStore::open(path)?;
        store.check_schema()?;
        Ok(Self::new(store))
    }

    async fn with_store<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&LinkStore) -> jumpgate_core::Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || {
            let guard = store.lock();
            f(&guard)
        })
        .await??;
        Ok(result)
    }
}

#[async_trait]
impl DataSource for SqliteDataSource {
    async fn load_static(&self) -> Result<Vec<JumpRow>, BackendError> {
        self.with_store(|store| store.static_rows()).await
    }

    async fn load_dynamic(
        &self,
        collections: &CollectionIds,
        predicate: &LinkPredicate,
    ) -> Result<Vec<JumpRow>, BackendError> {
        let collections = collections.clone();
        let predicate = predicate.clone();
        self.with_store(move |store| store.dynamic_rows(&collections, &predicate))
            .await
    }
}

/// Local operators may read every active collection.
#[async_trait]
impl AccessControl for SqliteDataSource {
    async fn check_access(
        &self,
        collection: CollectionId,
        caller: &Caller,
    ) -> Result<Option<CollectionInfo>, BackendError> {
        let record = self
            .with_store(move |store| store.collection(collection))
            .await
            .map_err(|e| BackendError::access_check(format!("collection {}: {}", collection, e)))?;

        let info = record
            .filter(|r| r.active)
            .map(|r| CollectionInfo {
                id: r.id,
                name: r.name,
            });
        debug!(
            "Access for '{}' to collection {}: {}",
            caller.id,
            collection,
            if info.is_some() { "granted" } else { "denied" }
        );
        Ok(info)
    }
}
