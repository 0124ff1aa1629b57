//! Route orchestration.
//!
//! A search first asks the external oracle, handing it the filtered dynamic
//! connections as extra edges. Only when the oracle fails does it build the
//! full graph (static + dynamic) and run the bounded local search.
//!
//! The two phases are separate calls: [`RouteOrchestrator::search_external`]
//! reports an oracle failure as [`ExternalOutcome::OracleFailed`] rather
//! than as an error, and [`RouteOrchestrator::search`] picks the fallback.

use std::collections::HashSet;
use std::sync::Arc;

use jumpgate_core::{apply_security_filter, find_path, GraphStore, NodeId};
use tracing::{debug, info, warn};

use crate::error::{BackendError, OracleError};
use crate::loader::DataLoader;
use crate::traits::{OracleOptions, RouteOracle};
use crate::types::{PathEntry, RouteQuery, RouteResult, SearchType};

pub use jumpgate_config::DEFAULT_SEARCH_DEPTH;

/// Result of the external phase.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalOutcome {
    /// The oracle answered; the result is final.
    Completed(RouteResult),
    /// The oracle failed; the caller should search locally.
    OracleFailed(OracleError),
}

/// Coordinates oracle search and local fallback for single queries.
#[derive(Clone)]
pub struct RouteOrchestrator {
    loader: DataLoader,
    oracle: Arc<dyn RouteOracle>,
    default_depth: usize,
}

impl RouteOrchestrator {
    pub fn new(loader: DataLoader, oracle: Arc<dyn RouteOracle>) -> Self {
        Self {
            loader,
            oracle,
            default_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Set the ceiling used for queries with `max_depth == 0`.
    pub fn with_default_depth(mut self, depth: usize) -> Self {
        self.default_depth = depth;
        self
    }

    pub fn default_depth(&self) -> usize {
        self.default_depth
    }

    fn effective_depth(&self, query: &RouteQuery) -> usize {
        if query.max_depth == 0 {
            self.default_depth
        } else {
            query.max_depth
        }
    }

    /// Search externally, falling back to local search on oracle failure.
    pub async fn search(&self, query: &RouteQuery) -> Result<RouteResult, BackendError> {
        match self.search_external(query).await? {
            ExternalOutcome::Completed(result) => Ok(result),
            ExternalOutcome::OracleFailed(oracle) => {
                warn!(
                    "Route oracle failed for {} -> {} ({}), searching locally",
                    query.from, query.to, oracle
                );
                self.search_local(query)
                    .await
                    .map_err(|local| BackendError::fallback_failed(oracle, local))
            }
        }
    }

    /// Ask the oracle, passing filtered dynamic connections as extra edges.
    ///
    /// A route longer than the depth limit is reported as not found with
    /// the limit as `depth_searched`.
    pub async fn search_external(
        &self,
        query: &RouteQuery,
    ) -> Result<ExternalOutcome, BackendError> {
        let max_depth = self.effective_depth(query);
        let mut result = RouteResult::new(SearchType::External, max_depth);

        if query.from == 0 || query.to == 0 {
            return Ok(ExternalOutcome::Completed(result));
        }

        let mut graph = GraphStore::new();
        self.loader
            .merge_dynamic(&mut graph, &query.collections, &query.filter)
            .await?;
        apply_security_filter(&mut graph, query.filter.flag, &endpoints(query));

        let options = OracleOptions {
            security: query.filter.flag,
            edges: graph.edges(),
        };
        debug!(
            "Querying route oracle {} -> {} with {} extra connections",
            query.from,
            query.to,
            options.edges.len()
        );

        let route = match self.oracle.find_route(query.from, query.to, &options).await {
            Ok(route) => route,
            Err(e) => return Ok(ExternalOutcome::OracleFailed(e)),
        };

        if route.is_empty() {
            return Ok(ExternalOutcome::Completed(result));
        }

        let jumps = route.len() - 1;
        result.jump_count = jumps;

        if jumps <= max_depth {
            result.found = true;
            result.depth_searched = jumps;

            // names and security only; adds no connectivity to the answer
            self.loader.merge_static(&mut graph).await?;
            result.path = route.iter().map(|id| entry_for_id(&graph, *id)).collect();
        } else {
            result.depth_searched = max_depth;
        }

        Ok(ExternalOutcome::Completed(result))
    }

    /// Search the merged static + dynamic graph with the bounded BFS.
    pub async fn search_local(&self, query: &RouteQuery) -> Result<RouteResult, BackendError> {
        let max_depth = self.effective_depth(query);
        let mut result = RouteResult::new(SearchType::Local, max_depth);

        if query.from == 0 || query.to == 0 {
            return Ok(result);
        }

        let mut graph = GraphStore::new();
        self.loader.merge_static(&mut graph).await?;
        self.loader
            .merge_dynamic(&mut graph, &query.collections, &query.filter)
            .await?;
        let pruned = apply_security_filter(&mut graph, query.filter.flag, &endpoints(query));
        if pruned > 0 {
            debug!("Security filter pruned {} nodes", pruned);
        }

        let (Some(from), Some(to)) = (
            graph.index().name_of(query.from),
            graph.index().name_of(query.to),
        ) else {
            debug!("Route endpoints {} / {} not in graph", query.from, query.to);
            return Ok(result);
        };

        let Some(list) = graph.adjacency().get(from) else {
            return Ok(result);
        };

        let path: Vec<String> = if list.contains_neighbor(to) {
            vec![from.to_string(), to.to_string()]
        } else {
            let search = find_path(graph.adjacency(), from, to, max_depth);
            result.depth_searched = search.expansions;
            search.path
        };

        if path.is_empty() {
            return Ok(result);
        }

        result.found = true;
        result.jump_count = path.len() - 1;
        result.path = path
            .iter()
            .map(|name| PathEntry {
                name: name.clone(),
                security: graph.security_of(name),
            })
            .collect();

        info!(
            "Local route {} -> {}: {} jumps",
            from, to, result.jump_count
        );
        Ok(result)
    }
}

fn endpoints(query: &RouteQuery) -> HashSet<NodeId> {
    [query.from, query.to].into_iter().collect()
}

fn entry_for_id(graph: &GraphStore, id: NodeId) -> PathEntry {
    match graph.node(id) {
        Some(node) => PathEntry {
            name: node.name.clone(),
            security: Some(node.security),
        },
        None => PathEntry {
            name: id.to_string(),
            security: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::oracle::DisabledOracle;
    use crate::traits::DataSource;
    use async_trait::async_trait;
    use jumpgate_core::{
        CollectionIds, JumpRow, LinkFilterSpec, LinkPredicate, SecurityMode,
    };
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    fn row(id: u64, name: &str, security: f64, jumps: &str) -> JumpRow {
        JumpRow {
            system_id: id,
            name: name.into(),
            region_id: 1,
            constellation_id: 1,
            security,
            jump_nodes: jumps.into(),
        }
    }

    /// Static chain A(1) - B(2) - C(3); collection rows are configurable.
    struct FakeSource {
        dynamic: Vec<JumpRow>,
    }

    #[async_trait]
    impl DataSource for FakeSource {
        async fn load_static(&self) -> Result<Vec<JumpRow>, BackendError> {
            Ok(vec![
                row(1, "A", 1.0, "B"),
                row(2, "B", 0.1, "A:C"),
                row(3, "C", 0.7, "B"),
            ])
        }

        async fn load_dynamic(
            &self,
            _collections: &CollectionIds,
            _predicate: &LinkPredicate,
        ) -> Result<Vec<JumpRow>, BackendError> {
            Ok(self.dynamic.clone())
        }
    }

    /// Every read fails.
    struct BrokenSource;

    #[async_trait]
    impl DataSource for BrokenSource {
        async fn load_static(&self) -> Result<Vec<JumpRow>, BackendError> {
            Err(BackendError::data_source("catalog offline"))
        }

        async fn load_dynamic(
            &self,
            _collections: &CollectionIds,
            _predicate: &LinkPredicate,
        ) -> Result<Vec<JumpRow>, BackendError> {
            Err(BackendError::data_source("collections offline"))
        }
    }

    fn broken_orchestrator(oracle: Arc<dyn RouteOracle>) -> RouteOrchestrator {
        let loader = DataLoader::new(Arc::new(BrokenSource), Arc::new(MemoryCacheStore::new(16)));
        RouteOrchestrator::new(loader, oracle)
    }

    /// Oracle returning a fixed answer and recording the options it saw.
    struct ScriptedOracle {
        answer: Result<Vec<NodeId>, OracleError>,
        seen: Mutex<Vec<OracleOptions>>,
    }

    impl ScriptedOracle {
        fn new(answer: Result<Vec<NodeId>, OracleError>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RouteOracle for ScriptedOracle {
        async fn find_route(
            &self,
            _from: NodeId,
            _to: NodeId,
            options: &OracleOptions,
        ) -> Result<Vec<NodeId>, OracleError> {
            self.seen.lock().push(options.clone());
            self.answer.clone()
        }
    }

    fn orchestrator(dynamic: Vec<JumpRow>, oracle: Arc<dyn RouteOracle>) -> RouteOrchestrator {
        let loader = DataLoader::new(
            Arc::new(FakeSource { dynamic }),
            Arc::new(MemoryCacheStore::new(16)),
        );
        RouteOrchestrator::new(loader, oracle)
    }

    fn query(max_depth: usize) -> RouteQuery {
        RouteQuery {
            from: 1,
            to: 3,
            max_depth,
            ..Default::default()
        }
    }

    fn names(result: &RouteResult) -> Vec<&str> {
        result.path.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_local_route_found() {
        let orch = orchestrator(vec![], Arc::new(DisabledOracle));
        let result = orch.search(&query(5)).await.unwrap();

        assert!(result.found);
        assert_eq!(result.search_type, SearchType::Local);
        assert_eq!(result.jump_count, 2);
        assert_eq!(names(&result), vec!["A", "B", "C"]);
        assert_eq!(result.path[1].security, Some(0.1));
    }

    #[tokio::test]
    async fn test_local_depth_exhausted() {
        let orch = orchestrator(vec![], Arc::new(DisabledOracle));
        let result = orch.search(&query(1)).await.unwrap();

        assert!(!result.found);
        assert_eq!(result.depth_searched, 1);
        assert_eq!(result.max_depth, 1);
        assert!(result.path.is_empty());
    }

    #[tokio::test]
    async fn test_direct_neighbor_shortcut() {
        let orch = orchestrator(vec![], Arc::new(DisabledOracle));
        let result = orch
            .search_local(&RouteQuery {
                from: 1,
                to: 2,
                // a zero-expansion budget would stop a real BFS at once
                max_depth: 1,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(result.found);
        assert_eq!(result.jump_count, 1);
        assert_eq!(result.depth_searched, 0);
        assert_eq!(names(&result), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_local_unknown_endpoint() {
        let orch = orchestrator(vec![], Arc::new(DisabledOracle));
        let result = orch
            .search_local(&RouteQuery {
                from: 1,
                to: 42,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!result.found);
        assert_eq!(result.jump_count, 0);
        assert_eq!(result.max_depth, DEFAULT_SEARCH_DEPTH);
    }

    #[tokio::test]
    async fn test_secure_filter_blocks_local_route() {
        let orch = orchestrator(vec![], Arc::new(DisabledOracle));
        let mut q = query(10);
        q.filter.flag = SecurityMode::Secure;

        let result = orch.search(&q).await.unwrap();
        assert!(!result.found);
    }

    #[tokio::test]
    async fn test_dynamic_link_used_locally() {
        let dynamic = vec![row(1, "A", 1.0, "C"), row(3, "C", 0.7, "A")];
        let orch = orchestrator(dynamic, Arc::new(DisabledOracle));
        let mut q = query(10);
        q.collections = CollectionIds::from_raw([1]);
        q.filter = LinkFilterSpec {
            wormholes: true,
            flag: SecurityMode::Secure,
            ..Default::default()
        };

        let result = orch.search(&q).await.unwrap();
        assert!(result.found);
        assert_eq!(result.jump_count, 1);
    }

    #[tokio::test]
    async fn test_oracle_route_used() {
        let oracle = Arc::new(ScriptedOracle::new(Ok(vec![1, 2, 3])));
        let orch = orchestrator(vec![], oracle.clone());
        let result = orch.search(&query(5)).await.unwrap();

        assert!(result.found);
        assert_eq!(result.search_type, SearchType::External);
        assert_eq!(result.jump_count, 2);
        assert_eq!(result.depth_searched, 2);
        assert_eq!(names(&result), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_oracle_receives_filtered_dynamic_edges() {
        let dynamic = vec![
            row(1, "A", 1.0, "D"),
            row(4, "D", 0.0, "A:C"),
            row(3, "C", 0.7, "D"),
        ];
        let oracle = Arc::new(ScriptedOracle::new(Ok(vec![])));
        let orch = orchestrator(dynamic.clone(), oracle.clone());

        let mut q = query(5);
        q.collections = CollectionIds::from_raw([1]);
        q.filter.wormholes = true;
        orch.search(&q).await.unwrap();

        q.filter.flag = SecurityMode::Secure;
        orch.search(&q).await.unwrap();

        let seen = oracle.seen.lock();
        let mut open = seen[0].edges.clone();
        open.sort();
        assert_eq!(open, vec![(1, 4), (3, 4), (4, 1), (4, 3)]);
        // D is insecure and not an endpoint
        assert!(seen[1].edges.is_empty());
        assert_eq!(seen[1].security, SecurityMode::Secure);
    }

    #[tokio::test]
    async fn test_oracle_route_too_long() {
        let oracle = Arc::new(ScriptedOracle::new(Ok(vec![1, 2, 3])));
        let orch = orchestrator(vec![], oracle);
        let result = orch.search(&query(1)).await.unwrap();

        assert!(!result.found);
        assert_eq!(result.search_type, SearchType::External);
        assert_eq!(result.jump_count, 2);
        assert_eq!(result.depth_searched, 1);
        assert!(result.path.is_empty());
    }

    #[tokio::test]
    async fn test_oracle_empty_route() {
        let oracle = Arc::new(ScriptedOracle::new(Ok(vec![])));
        let orch = orchestrator(vec![], oracle);
        let result = orch.search(&query(5)).await.unwrap();

        assert!(!result.found);
        assert_eq!(result.search_type, SearchType::External);
        assert_eq!(result.jump_count, 0);
        assert_eq!(result.depth_searched, 0);
    }

    #[tokio::test]
    async fn test_oracle_unknown_id_kept_as_number() {
        let oracle = Arc::new(ScriptedOracle::new(Ok(vec![1, 99, 3])));
        let orch = orchestrator(vec![], oracle);
        let result = orch.search(&query(5)).await.unwrap();

        assert_eq!(result.path[1].name, "99");
        assert_eq!(result.path[1].security, None);
    }

    #[tokio::test]
    async fn test_oracle_failure_falls_back() {
        let oracle = Arc::new(ScriptedOracle::new(Err(OracleError::Remote(
            "timeout".into(),
        ))));
        let orch = orchestrator(vec![], oracle);

        let outcome = orch.search_external(&query(5)).await.unwrap();
        assert!(matches!(outcome, ExternalOutcome::OracleFailed(_)));

        let result = orch.search(&query(5)).await.unwrap();
        assert_eq!(result.search_type, SearchType::Local);
        assert!(result.found);
    }

    #[tokio::test]
    async fn test_zero_depth_uses_default() {
        let orch = orchestrator(vec![], Arc::new(DisabledOracle)).with_default_depth(3);
        let result = orch.search(&query(0)).await.unwrap();
        assert_eq!(result.max_depth, 3);
        assert!(result.found);
    }

    #[tokio::test]
    async fn test_missing_endpoint_ids() {
        let orch = orchestrator(vec![], Arc::new(DisabledOracle));
        let result = orch
            .search(&RouteQuery {
                from: 0,
                to: 3,
                ..Default::default()
            })
            .await
            .unwrap();

        // no oracle call is made, so the external shell is final
        assert_eq!(result.search_type, SearchType::External);
        assert!(!result.found);
    }

    #[tokio::test]
    async fn test_data_source_failure_skips_fallback() {
        let oracle = Arc::new(ScriptedOracle::new(Ok(vec![1, 3])));
        let orch = broken_orchestrator(oracle.clone());
        let query = RouteQuery {
            collections: CollectionIds::from_raw([1]),
            filter: LinkFilterSpec {
                wormholes: true,
                ..Default::default()
            },
            ..query(5)
        };

        let err = orch.search(&query).await.unwrap_err();

        assert!(matches!(err, BackendError::DataSource(_)));
        assert!(err.to_string().contains("collections offline"));
        assert!(oracle.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_failure_names_both_causes() {
        let orch = broken_orchestrator(Arc::new(DisabledOracle));

        let err = orch.search(&query(5)).await.unwrap_err();

        match err {
            BackendError::FallbackFailed { oracle, local } => {
                assert_eq!(oracle, OracleError::Disabled);
                assert!(local.to_string().contains("catalog offline"));
            }
            other => panic!("expected FallbackFailed, got {other}"),
        }
    }
}
