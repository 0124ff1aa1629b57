//! Collaborator traits.
//!
//! Route search depends on four collaborators it does not own: a source of
//! link rows, an external route oracle, an authorization check for
//! collections and a keyed cache store. Each is a trait object so the
//! orchestrator can be wired to SQLite and HTTP in production and to
//! in-memory fakes in tests.

use std::time::Duration;

use async_trait::async_trait;
use jumpgate_core::{CollectionId, CollectionIds, JumpRow, LinkPredicate, NodeId, SecurityMode};

use crate::error::{BackendError, OracleError};
use crate::types::{Caller, CollectionInfo};

/// Read-only source of jump rows.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Rows of the fixed catalog graph.
    async fn load_static(&self) -> Result<Vec<JumpRow>, BackendError>;

    /// Rows for `collections`, keeping only links `predicate` accepts.
    async fn load_dynamic(
        &self,
        collections: &CollectionIds,
        predicate: &LinkPredicate,
    ) -> Result<Vec<JumpRow>, BackendError>;
}

/// Options sent to the route oracle with every query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleOptions {
    pub security: SecurityMode,
    /// Extra directed connections the oracle should consider
    pub edges: Vec<(NodeId, NodeId)>,
}

/// External route-finding service.
#[async_trait]
pub trait RouteOracle: Send + Sync {
    /// Node ids from `from` to `to` inclusive; empty when no route exists.
    async fn find_route(
        &self,
        from: NodeId,
        to: NodeId,
        options: &OracleOptions,
    ) -> Result<Vec<NodeId>, OracleError>;
}

/// Authorization check for collections.
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Collection info when `caller` may read `collection`, `None` when denied.
    async fn check_access(
        &self,
        collection: CollectionId,
        caller: &Caller,
    ) -> Result<Option<CollectionInfo>, BackendError>;
}

/// Keyed store with per-entry lifetimes.
///
/// Concurrent writers to the same key are last-writer-wins.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration);
}
