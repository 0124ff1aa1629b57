//! Jumpgate Core - jump graph assembly and bounded route search
//!
//! This crate provides the synchronous, in-memory part of route search:
//! - Data model for link filter flags, collection ids and jump rows
//! - Per-search graph store (nodes, name index, sentinel-terminated adjacency)
//! - Security filtering of the merged graph
//! - Bounded breadth-first path search
//! - SQLite link store serving static and collection-scoped rows

pub mod error;
pub mod filter;
pub mod graph;
pub mod model;
pub mod pathfinder;
pub mod rows;
pub mod store;

// Re-exports for convenience
pub use error::{CoreError, Result};
pub use filter::{apply_security_filter, SECURE_THRESHOLD};
pub use graph::{AdjacencyList, GraphStore, NameIndex, NeighborList, Node};
pub use model::{
    coerce_id, normalize_name, CollectionId, CollectionIds, CollectionRecord, JumpRow,
    LinkFilterSpec, LinkPredicate, LinkRecord, LinkScope, LinkType, NodeId, SecurityMode,
    SystemRecord,
};
pub use pathfinder::{find_path, PathSearch, DEFAULT_MAX_EXPANSIONS};
pub use rows::assemble_dynamic_rows;

// Store re-exports
pub use store::schema::LINK_STORE_SCHEMA_VERSION;
pub use store::LinkStore;
