//! Per-search jump graph.
//!
//! A [`GraphStore`] is built for one route search from static and dynamic
//! [`JumpRow`]s and dropped afterwards. It holds three views that must stay
//! consistent with each other:
//!
//! - node records keyed by id
//! - a bidirectional [`NameIndex`] (name <-> id)
//! - an [`AdjacencyList`] of neighbor names keyed by node name
//!
//! # Neighbor list sentinel
//!
//! Every [`NeighborList`] ends with its owner's id rendered as a string. All
//! real neighbors precede it. Edge enumeration and the direct-neighbor check
//! stop at the sentinel; [`NeighborList::neighbors`] already excludes it.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{normalize_name, JumpRow, NodeId};

/// A node of the jump graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Normalized (upper-case) display name
    pub name: String,
    pub region_id: u64,
    pub constellation_id: u64,
    pub security: f64,
}

// ============================================================================
// Name index
// ============================================================================

/// Bidirectional name <-> id mapping; one id per name and one name per id.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    by_name: HashMap<String, NodeId>,
    by_id: HashMap<NodeId, String>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pair. First registration wins; returns false when either
    /// side is already bound elsewhere.
    pub fn insert(&mut self, name: &str, id: NodeId) -> bool {
        match (self.by_name.get(name), self.by_id.get(&id)) {
            (Some(existing), _) => *existing == id,
            (None, Some(_)) => false,
            (None, None) => {
                self.by_name.insert(name.to_string(), id);
                self.by_id.insert(id, name.to_string());
                true
            }
        }
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Remove both directions of the entry for `id`.
    pub fn remove_id(&mut self, id: NodeId) -> Option<String> {
        let name = self.by_id.remove(&id)?;
        self.by_name.remove(&name);
        Some(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ============================================================================
// Adjacency
// ============================================================================

/// Ordered neighbor names of one node, terminated by the owner sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborList {
    owner: NodeId,
    entries: Vec<String>,
}

impl NeighborList {
    pub fn new(owner: NodeId) -> Self {
        Self {
            owner,
            entries: vec![owner.to_string()],
        }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// The trailing sentinel entry (owner id as a string).
    pub fn sentinel(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or_default()
    }

    /// Real neighbors, in order, excluding the sentinel.
    pub fn neighbors(&self) -> &[String] {
        &self.entries[..self.entries.len().saturating_sub(1)]
    }

    /// Every stored entry including the sentinel.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn contains_neighbor(&self, name: &str) -> bool {
        self.neighbors().iter().any(|n| n == name)
    }

    /// Put `names` ahead of the recorded neighbors, dropping duplicates, and
    /// re-affix the sentinel if it is no longer last.
    pub fn merge_front<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        let sentinel = self.owner.to_string();
        let mut merged: Vec<String> = Vec::with_capacity(self.entries.len());

        for name in names {
            if name != sentinel && !merged.contains(&name) {
                merged.push(name);
            }
        }
        for name in self.entries.drain(..) {
            if name != sentinel && !merged.contains(&name) {
                merged.push(name);
            }
        }

        if merged.last() != Some(&sentinel) {
            merged.push(sentinel);
        }
        self.entries = merged;
    }
}

/// Neighbor lists keyed by node name, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyList {
    lists: BTreeMap<String, NeighborList>,
}

impl AdjacencyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&NeighborList> {
        self.lists.get(name)
    }

    /// Real neighbors of `name`; empty if the node is unknown.
    pub fn neighbors(&self, name: &str) -> &[String] {
        self.lists
            .get(name)
            .map(NeighborList::neighbors)
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NeighborList)> {
        self.lists.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn entry(&mut self, name: &str, owner: NodeId) -> &mut NeighborList {
        self.lists
            .entry(name.to_string())
            .or_insert_with(|| NeighborList::new(owner))
    }

    fn remove(&mut self, name: &str) -> Option<NeighborList> {
        self.lists.remove(name)
    }

    /// Build directly from `(name, id, neighbors)` triples.
    pub fn from_triples<'a, I>(triples: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, NodeId, Vec<&'a str>)>,
    {
        let mut adjacency = Self::new();
        for (name, id, neighbors) in triples {
            adjacency
                .entry(&normalize_name(name), id)
                .merge_front(neighbors.into_iter().map(normalize_name));
        }
        adjacency
    }
}

// ============================================================================
// Graph store
// ============================================================================

/// Nodes, name index and adjacency for one search.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: HashMap<NodeId, Node>,
    index: NameIndex,
    adjacency: AdjacencyList,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of rows.
    ///
    /// Node records and index entries are first-seen-wins; neighbor names from
    /// this batch are placed ahead of previously recorded ones.
    pub fn merge_rows(&mut self, rows: &[JumpRow]) {
        for row in rows {
            let name = normalize_name(&row.name);
            let id = row.system_id;

            self.nodes.entry(id).or_insert_with(|| Node {
                id,
                name: name.clone(),
                region_id: row.region_id,
                constellation_id: row.constellation_id,
                security: row.security,
            });

            if !self.index.insert(&name, id) {
                warn!(
                    "Name index conflict for '{}' ({}), keeping first registration",
                    name, id
                );
            }

            self.adjacency
                .entry(&name, id)
                .merge_front(row.neighbor_names());
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.index.id_of(name).and_then(|id| self.nodes.get(&id))
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    pub fn adjacency(&self) -> &AdjacencyList {
        &self.adjacency
    }

    /// Name of node `id`, if it is still indexed.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.name.as_str())
    }

    pub fn security_of(&self, name: &str) -> Option<f64> {
        self.node_by_name(name).map(|n| n.security)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.adjacency.is_empty()
    }

    /// Drop node `id` from every view. Returns true if anything was removed.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let node = self.nodes.remove(&id);
        let indexed = self.index.remove_id(id);

        let mut removed = node.is_some() || indexed.is_some();
        for name in [node.map(|n| n.name), indexed].into_iter().flatten() {
            removed |= self.adjacency.remove(&name).is_some();
        }
        removed
    }

    /// Remove an adjacency entry whose owner has no node record.
    pub(crate) fn remove_adjacency(&mut self, name: &str) -> bool {
        self.adjacency.remove(name).is_some()
    }

    /// Directed `(source, target)` id pairs, one per neighbor entry.
    ///
    /// Sentinels are skipped, as are endpoints missing from the name index.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for (name, list) in self.adjacency.iter() {
            let Some(source) = self.index.id_of(name) else {
                continue;
            };
            for target in list.neighbors() {
                if let Some(target) = self.index.id_of(target) {
                    edges.push((source, target));
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(id: NodeId, name: &str, security: f64, jumps: &str) -> JumpRow {
        JumpRow {
            system_id: id,
            name: name.to_string(),
            region_id: 1,
            constellation_id: 2,
            security,
            jump_nodes: jumps.to_string(),
        }
    }

    #[test]
    fn test_neighbor_list_sentinel_is_last() {
        let mut list = NeighborList::new(42);
        assert_eq!(list.entries(), &["42".to_string()]);
        assert!(list.neighbors().is_empty());

        list.merge_front(vec!["B".to_string(), "C".to_string()]);
        assert_eq!(list.entries(), &["B", "C", "42"]);
        assert_eq!(list.sentinel(), "42");
        assert_eq!(list.neighbors(), &["B", "C"]);
    }

    #[test]
    fn test_merge_front_prepends_and_dedups() {
        let mut list = NeighborList::new(1);
        list.merge_front(vec!["B".to_string(), "C".to_string()]);
        list.merge_front(vec!["D".to_string(), "C".to_string()]);

        assert_eq!(list.entries(), &["D", "C", "B", "1"]);
    }

    #[test]
    fn test_merge_rows_static_then_dynamic() {
        let mut graph = GraphStore::new();
        graph.merge_rows(&[row(1, "Alpha", 0.9, "BRAVO")]);
        graph.merge_rows(&[row(1, "alpha", 0.1, "charlie:bravo")]);

        let list = graph.adjacency().get("ALPHA").unwrap();
        assert_eq!(list.entries(), &["CHARLIE", "BRAVO", "1"]);

        // first-seen record wins
        assert_eq!(graph.node(1).unwrap().security, 0.9);
        assert_eq!(graph.index().id_of("ALPHA"), Some(1));
        assert_eq!(graph.name_of(1), Some("ALPHA"));
    }

    #[test]
    fn test_name_index_is_one_to_one() {
        let mut index = NameIndex::new();
        assert!(index.insert("A", 1));
        assert!(index.insert("A", 1));
        assert!(!index.insert("A", 2));
        assert!(!index.insert("B", 1));
        assert_eq!(index.len(), 1);

        assert_eq!(index.remove_id(1), Some("A".to_string()));
        assert!(index.is_empty());
        assert_eq!(index.id_of("A"), None);
    }

    #[test]
    fn test_remove_node_clears_all_views() {
        let mut graph = GraphStore::new();
        graph.merge_rows(&[row(1, "A", 0.9, "B"), row(2, "B", 0.9, "A")]);

        assert!(graph.remove_node(2));
        assert!(graph.node(2).is_none());
        assert!(graph.index().id_of("B").is_none());
        assert!(!graph.adjacency().contains("B"));
        assert!(!graph.remove_node(2));
    }

    #[test]
    fn test_edges_skip_sentinel_and_unindexed() {
        let mut graph = GraphStore::new();
        graph.merge_rows(&[row(1, "A", 0.9, "B:GHOST"), row(2, "B", 0.9, "A")]);

        let mut edges = graph.edges();
        edges.sort();
        assert_eq!(edges, vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn test_adjacency_from_triples() {
        let adjacency =
            AdjacencyList::from_triples(vec![("a", 1, vec!["b", "c"]), ("b", 2, vec!["a"])]);
        assert_eq!(adjacency.neighbors("A"), &["B", "C"]);
        assert_eq!(adjacency.get("B").unwrap().sentinel(), "2");
        assert!(adjacency.neighbors("Z").is_empty());
    }
}
