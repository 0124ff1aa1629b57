//! Bounded breadth-first route search.
//!
//! The ceiling bounds the number of nodes taken off the frontier, not the
//! length of the resulting path. Once it is spent the search stops even if
//! the target is reachable further out, so a result found under a tight
//! ceiling is not guaranteed to be the fewest-hop route.

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::graph::AdjacencyList;

/// Default expansion ceiling.
pub const DEFAULT_MAX_EXPANSIONS: usize = 50_000;

/// Outcome of [`find_path`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSearch {
    /// Node names from origin to target; empty when nothing was found.
    pub path: Vec<String>,
    /// Frontier nodes expanded before the search stopped.
    pub expansions: usize,
}

impl PathSearch {
    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Search `adjacency` for a route from `from` to `to`.
///
/// The target is checked while scanning the neighbors of each expanded node;
/// on a hit the path is rebuilt by walking predecessors back to `from`.
/// Neighbors are visited in list order, so equal inputs give equal paths.
pub fn find_path<'a>(
    adjacency: &'a AdjacencyList,
    from: &'a str,
    to: &str,
    max_expansions: usize,
) -> PathSearch {
    if !adjacency.contains(from) {
        return PathSearch::default();
    }

    let mut predecessor: HashMap<&'a str, Option<&'a str>> = HashMap::new();
    predecessor.insert(from, None);

    let mut frontier: VecDeque<&'a str> = VecDeque::from([from]);
    let mut remaining = max_expansions;

    while remaining > 0 {
        let Some(current) = frontier.pop_front() else {
            break;
        };
        remaining -= 1;

        for next in adjacency.neighbors(current) {
            let next = next.as_str();

            if next == to {
                let mut path = vec![to.to_string()];
                let mut cursor = Some(current);
                while let Some(node) = cursor {
                    path.push(node.to_string());
                    cursor = predecessor.get(node).copied().flatten();
                }
                path.reverse();

                let expansions = max_expansions - remaining;
                trace!("Path found after {} expansions", expansions);
                return PathSearch { path, expansions };
            }

            if !predecessor.contains_key(next) {
                predecessor.insert(next, Some(current));
                frontier.push_back(next);
            }
        }
    }

    PathSearch {
        path: Vec::new(),
        expansions: max_expansions - remaining,
    }
}
