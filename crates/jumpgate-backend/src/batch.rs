//! Multi-route batch search.
//!
//! A batch is truncated to the configured limit, collection access is
//! resolved once per collection id for the whole batch, and the remaining
//! items run concurrently. Each item echoes its request fields so callers
//! can reconcile responses even when no search ran.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use jumpgate_core::{CollectionId, CollectionIds};
use tracing::{debug, info, warn};

use crate::cache::RouteCache;
use crate::error::BackendError;
use crate::orchestrator::RouteOrchestrator;
use crate::traits::AccessControl;
use crate::types::{
    BatchRequest, BatchResponse, Caller, CollectionInfo, RouteQuery, RouteRequest, RouteResponse,
    RouteResult, SearchType,
};

/// Default maximum number of routes per batch.
pub const DEFAULT_BATCH_LIMIT: usize = jumpgate_config::DEFAULT_ROUTE_LIMIT;

/// Access decisions made while serving one batch.
type AccessMemo = DashMap<CollectionId, Option<CollectionInfo>>;

/// Serves batch route requests through the cache and orchestrator.
#[derive(Clone)]
pub struct BatchSearcher {
    orchestrator: RouteOrchestrator,
    cache: RouteCache,
    access: Arc<dyn AccessControl>,
    limit: usize,
}

impl BatchSearcher {
    pub fn new(
        orchestrator: RouteOrchestrator,
        cache: RouteCache,
        access: Arc<dyn AccessControl>,
    ) -> Self {
        Self {
            orchestrator,
            cache,
            access,
            limit: DEFAULT_BATCH_LIMIT,
        }
    }

    /// Set the maximum number of routes served per batch.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn orchestrator(&self) -> &RouteOrchestrator {
        &self.orchestrator
    }

    /// Search every route of `request` on behalf of `caller`.
    ///
    /// Requests past the limit are dropped silently. Failures never abort
    /// the batch; they surface in the affected item's `error` field.
    pub async fn search_batch(&self, request: &BatchRequest, caller: &Caller) -> BatchResponse {
        let items = &request.route_data[..request.route_data.len().min(self.limit)];
        if items.len() < request.route_data.len() {
            debug!(
                "Batch truncated from {} to {} routes",
                request.route_data.len(),
                items.len()
            );
        }

        let memo = self.resolve_access(items, caller).await;
        let routes_data = join_all(items.iter().map(|item| self.search_item(item, &memo))).await;

        info!("Served batch of {} routes", routes_data.len());
        BatchResponse { routes_data }
    }

    /// Check every distinct collection id of the batch once.
    ///
    /// A failed check counts as a denial.
    async fn resolve_access(&self, items: &[RouteRequest], caller: &Caller) -> AccessMemo {
        let wanted: CollectionIds = items
            .iter()
            .flat_map(|item| item.collection_ids.iter())
            .collect();

        let memo = AccessMemo::new();
        join_all(wanted.iter().map(|id| {
            let memo = &memo;
            async move {
                let decision = match self.access.check_access(id, caller).await {
                    Ok(decision) => decision,
                    Err(e) => {
                        warn!("Access check for collection {} failed: {}", id, e);
                        None
                    }
                };
                memo.insert(id, decision);
            }
        }))
        .await;

        memo
    }

    async fn search_item(&self, item: &RouteRequest, memo: &AccessMemo) -> RouteResponse {
        let collections: Vec<CollectionInfo> = item
            .collection_ids
            .iter()
            .filter_map(|id| memo.get(&id).and_then(|entry| entry.value().clone()))
            .collect();
        let accessible: CollectionIds = collections.iter().map(|c| c.id).collect();

        let mut response = RouteResponse {
            from: item.from.clone(),
            to: item.to.clone(),
            skip_search: item.skip_search,
            collections,
            collection_ids: accessible.to_vec(),
            filter: item.filter.clone(),
            result: None,
        };

        if item.skip_search || accessible.is_empty() {
            return response;
        }

        let key = RouteCache::key(&accessible, &item.from, &item.to, &item.filter);
        if let Some(cached) = self.cache.get(&key) {
            response.result = Some(cached);
            return response;
        }

        let query = RouteQuery {
            from: item.from.system_id,
            to: item.to.system_id,
            max_depth: 0,
            collections: accessible,
            filter: item.filter.clone(),
        };

        let result = match self.orchestrator.search(&query).await {
            Ok(result) => {
                self.cache.put(&key, &result);
                result
            }
            Err(e) => {
                warn!(
                    "Route {} -> {} failed: {}",
                    item.from.system_id, item.to.system_id, e
                );
                RouteResult::failed(
                    failed_search_type(&e),
                    self.orchestrator.default_depth(),
                    e.to_string(),
                )
            }
        };

        response.result = Some(result);
        response
    }
}

/// Phase a failed search ended in. Only a failed fallback reaches the
/// local phase; anything else stopped the external one.
fn failed_search_type(error: &BackendError) -> SearchType {
    match error {
        BackendError::FallbackFailed { .. } => SearchType::Local,
        _ => SearchType::External,
    }
}
