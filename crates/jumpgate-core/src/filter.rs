//! Security filtering of an assembled graph.

use std::collections::HashSet;

use tracing::debug;

use crate::graph::GraphStore;
use crate::model::{NodeId, SecurityMode};

/// Nodes rated below this are pruned by a secure search.
pub const SECURE_THRESHOLD: f64 = 0.45;

/// Prune insecure nodes when `mode` is [`SecurityMode::Secure`].
///
/// Ids in `exempt` (the search endpoints) are always kept. A pruned node
/// disappears from the node records, the name index and the adjacency list.
/// Other modes leave the graph untouched. Returns the number of nodes removed.
pub fn apply_security_filter(
    graph: &mut GraphStore,
    mode: SecurityMode,
    exempt: &HashSet<NodeId>,
) -> usize {
    if mode != SecurityMode::Secure {
        return 0;
    }

    let doomed: Vec<(String, NodeId)> = graph
        .adjacency()
        .iter()
        .filter_map(|(name, list)| {
            let owner = list.owner();
            if exempt.contains(&owner) {
                return None;
            }
            // unknown security counts as insecure
            let security = graph.node(owner).map(|n| n.security);
            match security {
                Some(sec) if sec >= SECURE_THRESHOLD => None,
                _ => Some((name.to_string(), owner)),
            }
        })
        .collect();

    let removed = doomed.len();
    for (name, owner) in doomed {
        graph.remove_node(owner);
        graph.remove_adjacency(&name);
    }

    debug!("Secure filter removed {} nodes", removed);
    removed
}
