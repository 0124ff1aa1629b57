//! Configured route service.
//!
//! Wires the SQLite link store, the route oracle and the shared in-memory
//! cache together from a [`JumpgateConfig`].

use std::path::Path;
use std::sync::Arc;

use jumpgate_config::JumpgateConfig;
use tracing::{info, warn};

use crate::batch::BatchSearcher;
use crate::cache::{MemoryCacheStore, RouteCache};
use crate::error::BackendError;
use crate::loader::DataLoader;
use crate::oracle::{DisabledOracle, EsiRouteClient};
use crate::orchestrator::RouteOrchestrator;
use crate::sqlite::SqliteDataSource;
use crate::traits::RouteOracle;
use crate::types::{BatchRequest, BatchResponse, Caller, RouteQuery, RouteResult};

/// Route search over a local link store.
#[derive(Clone)]
pub struct RouteService {
    searcher: BatchSearcher,
    cache: Arc<MemoryCacheStore>,
}

impl RouteService {
    /// Build the service described by `config`, resolving the database
    /// path against `workdir`.
    pub fn from_config(config: &JumpgateConfig, workdir: &Path) -> crate::Result<Self> {
        config.validate()?;

        let db_path = config.database_path(workdir);
        info!("Opening link store at {:?}", db_path);
        let source = Arc::new(SqliteDataSource::open(&db_path)?);

        let oracle: Arc<dyn RouteOracle> = if config.oracle.enabled {
            match EsiRouteClient::from_config(&config.oracle) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    warn!("Route oracle unavailable ({}), using local search only", e);
                    Arc::new(DisabledOracle)
                }
            }
        } else {
            Arc::new(DisabledOracle)
        };

        let cache = Arc::new(MemoryCacheStore::new(config.cache.capacity));
        let loader = DataLoader::new(source.clone(), cache.clone())
            .with_ttls(config.data.static_ttl(), config.data.dynamic_ttl());
        let orchestrator =
            RouteOrchestrator::new(loader, oracle).with_default_depth(config.route.search_depth);
        let routes = RouteCache::new(cache.clone(), config.route.cache_ttl());
        let searcher =
            BatchSearcher::new(orchestrator, routes, source).with_limit(config.route.limit);

        Ok(Self { searcher, cache })
    }

    /// Search a single route.
    pub async fn search(&self, query: &RouteQuery) -> crate::Result<RouteResult> {
        self.searcher.orchestrator().search(query).await
    }

    /// Search a batch of routes on behalf of `caller`.
    pub async fn search_batch(&self, request: &BatchRequest, caller: &Caller) -> BatchResponse {
        self.searcher.search_batch(request, caller).await
    }

    /// Shared cache store, for metrics.
    pub fn cache(&self) -> &MemoryCacheStore {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jumpgate_core::{JumpRow, LinkStore};
    use tempfile::TempDir;

    fn seed(dir: &TempDir) {
        let store = LinkStore::open(dir.path().join("jumpgate.db")).unwrap();
        store.init_schema().unwrap();
        let rows = [
            (1, "Alpha", "Beta"),
            (2, "Beta", "Alpha:Gamma"),
            (3, "Gamma", "Beta"),
        ];
        for (id, name, jumps) in rows {
            store
                .insert_static_row(&JumpRow {
                    system_id: id,
                    name: name.into(),
                    region_id: 1,
                    constellation_id: 1,
                    security: 0.8,
                    jump_nodes: jumps.into(),
                })
                .unwrap();
        }
    }

    fn offline_config() -> JumpgateConfig {
        let mut config = JumpgateConfig::default();
        config.oracle.enabled = false;
        config
    }

    #[tokio::test]
    async fn test_service_searches_local_store() {
        let dir = TempDir::new().unwrap();
        seed(&dir);

        let service = RouteService::from_config(&offline_config(), dir.path()).unwrap();
        let result = service
            .search(&RouteQuery {
                from: 1,
                to: 3,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(result.found);
        assert_eq!(result.jump_count, 2);
        assert_eq!(result.max_depth, jumpgate_config::DEFAULT_SEARCH_DEPTH);
        // static rows were cached by the load
        assert!(!service.cache().is_empty());
    }

    #[test]
    fn test_service_requires_initialized_store() {
        let dir = TempDir::new().unwrap();
        assert!(RouteService::from_config(&offline_config(), dir.path()).is_err());
    }
}
