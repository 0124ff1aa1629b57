//! Dynamic row assembly.
//!
//! Turns collection-scoped system and link records into [`JumpRow`]s: one row
//! per active system of a requested collection, listing the names of every
//! system reachable over a matching link. Systems left without neighbors are
//! omitted.

use std::collections::HashMap;

use crate::model::{CollectionIds, JumpRow, LinkPredicate, LinkRecord, SystemRecord};

/// Build dynamic rows for `collections`, keeping only links `predicate` accepts.
pub fn assemble_dynamic_rows(
    systems: &[SystemRecord],
    links: &[LinkRecord],
    collections: &CollectionIds,
    predicate: &LinkPredicate,
) -> Vec<JumpRow> {
    if collections.is_empty() || predicate.is_empty() {
        return Vec::new();
    }

    let by_key: HashMap<u64, &SystemRecord> = systems
        .iter()
        .filter(|s| collections.contains(s.collection_id))
        .map(|s| (s.key, s))
        .collect();

    // key -> neighbor names, in link order
    let mut neighbors: HashMap<u64, Vec<&str>> = HashMap::new();

    for link in links {
        if !link.active || !collections.contains(link.collection_id) || !predicate.matches(link) {
            continue;
        }
        if link.source == link.target {
            continue;
        }

        let (Some(source), Some(target)) = (by_key.get(&link.source), by_key.get(&link.target))
        else {
            continue;
        };

        for (from, to) in [(source, target), (target, source)] {
            if !to.active {
                continue;
            }
            let names = neighbors.entry(from.key).or_default();
            if !names.contains(&to.name.as_str()) {
                names.push(to.name.as_str());
            }
        }
    }

    systems
        .iter()
        .filter(|s| s.active && collections.contains(s.collection_id))
        .filter_map(|s| {
            let names = neighbors.get(&s.key).filter(|n| !n.is_empty())?;
            Some(JumpRow {
                system_id: s.system_id,
                name: s.name.clone(),
                region_id: s.region_id,
                constellation_id: s.constellation_id,
                security: s.security,
                jump_nodes: names.join(":"),
            })
        })
        .collect()
}
