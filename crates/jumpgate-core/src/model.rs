//! Data model shared by the loader, filter and search layers.
//!
//! Covers identifiers, the link filter flags sent with every route request,
//! the structured predicate derived from those flags, and the row/record
//! shapes produced by data sources.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Catalog identifier of a node (solar system).
pub type NodeId = u64;

/// Identifier of a user-managed collection of dynamic links (a map).
pub type CollectionId = u64;

/// Normalize a display name the way the graph indexes it.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

// ============================================================================
// Collection ids
// ============================================================================

/// A de-duplicated, ascending set of positive collection ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CollectionIds(BTreeSet<CollectionId>);

impl CollectionIds {
    /// Build from raw signed ids, dropping anything that is not positive.
    pub fn from_raw<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Self(
            ids.into_iter()
                .filter(|id| *id > 0)
                .map(|id| id as CollectionId)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: CollectionId) -> bool {
        self.0.contains(&id)
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CollectionId> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<CollectionId> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<CollectionId> for CollectionIds {
    fn from_iter<T: IntoIterator<Item = CollectionId>>(iter: T) -> Self {
        Self(iter.into_iter().filter(|id| *id > 0).collect())
    }
}

impl<'de> Deserialize<'de> for CollectionIds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_raw(raw.iter().filter_map(coerce_id)))
    }
}

/// Coerce a loosely typed JSON id (number or numeric string) into an integer.
pub fn coerce_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|v| i64::try_from(v).ok()))
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Filter flags
// ============================================================================

/// Security preference of a route search.
///
/// Only `Secure` prunes the graph; unknown values are treated as `Insecure`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SecurityMode {
    #[default]
    Shortest,
    Secure,
    Insecure,
}

impl SecurityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shortest => "shortest",
            Self::Secure => "secure",
            Self::Insecure => "insecure",
        }
    }
}

impl From<&str> for SecurityMode {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "shortest" => Self::Shortest,
            "secure" => Self::Secure,
            _ => Self::Insecure,
        }
    }
}

impl From<String> for SecurityMode {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link selection flags carried by a route request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkFilterSpec {
    pub stargates: bool,
    pub jumpbridges: bool,
    pub wormholes: bool,
    pub wormholes_reduced: bool,
    pub wormholes_critical: bool,
    pub wormholes_frigate: bool,
    #[serde(rename = "wormholesEOL")]
    pub wormholes_eol: bool,
    pub flag: SecurityMode,
}

impl LinkFilterSpec {
    /// Translate the flags into the predicate applied to dynamic links.
    pub fn predicate(&self) -> LinkPredicate {
        let mut predicate = LinkPredicate {
            include_eol: true,
            ..Default::default()
        };

        if self.stargates {
            predicate.scopes.insert(LinkScope::Stargate);
            predicate.include_types.insert(LinkType::Stargate);
        }

        if self.jumpbridges {
            predicate.scopes.insert(LinkScope::Jumpbridge);
            predicate.include_types.insert(LinkType::Jumpbridge);
        }

        if self.wormholes {
            predicate.scopes.insert(LinkScope::Wormhole);
            predicate.include_types.insert(LinkType::WormholeFresh);

            if self.wormholes_reduced {
                predicate.include_types.insert(LinkType::WormholeReduced);
            }
            if self.wormholes_critical {
                predicate.include_types.insert(LinkType::WormholeCritical);
            }
            if !self.wormholes_frigate {
                predicate.exclude_types.insert(LinkType::Frigate);
            }
            if !self.wormholes_eol {
                predicate.include_eol = false;
            }
        }

        predicate
    }

    /// Flags in a fixed field order, used for cache keys.
    pub fn key_parts(&self) -> [String; 8] {
        let b = |v: bool| if v { "1" } else { "0" }.to_string();
        [
            b(self.stargates),
            b(self.jumpbridges),
            b(self.wormholes),
            b(self.wormholes_reduced),
            b(self.wormholes_critical),
            b(self.wormholes_frigate),
            b(self.wormholes_eol),
            self.flag.as_str().to_string(),
        ]
    }
}

// ============================================================================
// Link predicate
// ============================================================================

/// Scope of a dynamic link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkScope {
    Stargate,
    Jumpbridge,
    #[serde(rename = "wh")]
    Wormhole,
}

impl LinkScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stargate => "stargate",
            Self::Jumpbridge => "jumpbridge",
            Self::Wormhole => "wh",
        }
    }
}

impl std::str::FromStr for LinkScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stargate" => Ok(Self::Stargate),
            "jumpbridge" => Ok(Self::Jumpbridge),
            "wh" | "wormhole" => Ok(Self::Wormhole),
            other => Err(other.to_string()),
        }
    }
}

/// Type/state tag of a dynamic link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Stargate,
    Jumpbridge,
    #[serde(rename = "wh_fresh")]
    WormholeFresh,
    #[serde(rename = "wh_reduced")]
    WormholeReduced,
    #[serde(rename = "wh_critical")]
    WormholeCritical,
    Frigate,
    PreserveMass,
}

/// Structured link selection derived from [`LinkFilterSpec`].
///
/// A link matches when its scope is selected, it carries at least one
/// included type, none of the excluded types, and (unless `include_eol`)
/// it is not flagged end-of-life.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LinkPredicate {
    pub scopes: BTreeSet<LinkScope>,
    pub include_types: BTreeSet<LinkType>,
    pub exclude_types: BTreeSet<LinkType>,
    pub include_eol: bool,
}

impl LinkPredicate {
    /// No scope selected: dynamic loading yields nothing.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn matches(&self, link: &LinkRecord) -> bool {
        if !self.scopes.contains(&link.scope) {
            return false;
        }
        if link.types.iter().any(|t| self.exclude_types.contains(t)) {
            return false;
        }
        if !self.include_types.is_empty()
            && !link.types.iter().any(|t| self.include_types.contains(t))
        {
            return false;
        }
        self.include_eol || !link.eol
    }
}

// ============================================================================
// Rows and records
// ============================================================================

/// One node plus its colon-separated list of directly reachable neighbor names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpRow {
    pub system_id: NodeId,
    pub name: String,
    pub region_id: u64,
    pub constellation_id: u64,
    pub security: f64,
    pub jump_nodes: String,
}

impl JumpRow {
    /// Neighbor names, normalized, empty segments skipped.
    pub fn neighbor_names(&self) -> impl Iterator<Item = String> + '_ {
        self.jump_nodes
            .split(':')
            .map(normalize_name)
            .filter(|n| !n.is_empty())
    }
}

/// A node placed on a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRecord {
    /// Row key, unique across collections.
    pub key: u64,
    pub collection_id: CollectionId,
    pub system_id: NodeId,
    pub name: String,
    pub region_id: u64,
    pub constellation_id: u64,
    pub security: f64,
    pub active: bool,
}

/// A dynamic link between two [`SystemRecord`] keys of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub collection_id: CollectionId,
    pub source: u64,
    pub target: u64,
    pub scope: LinkScope,
    pub types: Vec<LinkType>,
    pub eol: bool,
    pub active: bool,
}

/// Collection metadata as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: CollectionId,
    pub name: String,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(scope: LinkScope, types: &[LinkType], eol: bool) -> LinkRecord {
        LinkRecord {
            collection_id: 1,
            source: 1,
            target: 2,
            scope,
            types: types.to_vec(),
            eol,
            active: true,
        }
    }

    #[test]
    fn test_collection_ids_normalized() {
        let ids = CollectionIds::from_raw([3, 1, -4, 3, 0, 2]);
        assert_eq!(ids.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_collection_ids_lenient_deserialize() {
        let ids: CollectionIds = serde_json::from_str(r#"[5, "2", "x", null, -1, 2.0]"#).unwrap();
        assert_eq!(ids.to_vec(), vec![2, 5]);
    }

    #[test]
    fn test_security_mode_unknown_is_insecure() {
        let mode: SecurityMode = serde_json::from_str(r#""whatever""#).unwrap();
        assert_eq!(mode, SecurityMode::Insecure);
        let mode: SecurityMode = serde_json::from_str(r#""secure""#).unwrap();
        assert_eq!(mode, SecurityMode::Secure);
        assert_eq!(serde_json::to_string(&SecurityMode::Shortest).unwrap(), r#""shortest""#);
    }

    #[test]
    fn test_filter_spec_wire_names() {
        let spec: LinkFilterSpec = serde_json::from_str(
            r#"{"stargates": true, "wormholesEOL": true, "wormholesFrigate": true, "flag": "secure"}"#,
        )
        .unwrap();
        assert!(spec.stargates);
        assert!(spec.wormholes_eol);
        assert!(spec.wormholes_frigate);
        assert!(!spec.wormholes);
        assert_eq!(spec.flag, SecurityMode::Secure);
    }

    #[test]
    fn test_predicate_empty_without_scope() {
        let spec = LinkFilterSpec::default();
        assert!(spec.predicate().is_empty());
    }

    #[test]
    fn test_predicate_stargates_only() {
        let spec = LinkFilterSpec {
            stargates: true,
            ..Default::default()
        };
        let predicate = spec.predicate();

        assert!(predicate.matches(&link(LinkScope::Stargate, &[LinkType::Stargate], false)));
        assert!(!predicate.matches(&link(
            LinkScope::Wormhole,
            &[LinkType::WormholeFresh],
            false
        )));
    }

    #[test]
    fn test_predicate_wormhole_sub_flags() {
        let spec = LinkFilterSpec {
            wormholes: true,
            ..Default::default()
        };
        let predicate = spec.predicate();

        assert!(predicate.matches(&link(LinkScope::Wormhole, &[LinkType::WormholeFresh], false)));
        // reduced/critical need their own flags
        assert!(!predicate.matches(&link(
            LinkScope::Wormhole,
            &[LinkType::WormholeReduced],
            false
        )));
        // frigate holes excluded unless requested
        assert!(!predicate.matches(&link(
            LinkScope::Wormhole,
            &[LinkType::WormholeFresh, LinkType::Frigate],
            false
        )));
        // end-of-life excluded unless requested
        assert!(!predicate.matches(&link(LinkScope::Wormhole, &[LinkType::WormholeFresh], true)));

        let spec = LinkFilterSpec {
            wormholes: true,
            wormholes_reduced: true,
            wormholes_frigate: true,
            wormholes_eol: true,
            ..Default::default()
        };
        let predicate = spec.predicate();
        assert!(predicate.matches(&link(
            LinkScope::Wormhole,
            &[LinkType::WormholeReduced, LinkType::Frigate],
            true
        )));
        assert!(!predicate.matches(&link(
            LinkScope::Wormhole,
            &[LinkType::WormholeCritical],
            false
        )));
    }

    #[test]
    fn test_eol_ignored_for_non_wormhole_scopes() {
        let spec = LinkFilterSpec {
            jumpbridges: true,
            ..Default::default()
        };
        assert!(spec
            .predicate()
            .matches(&link(LinkScope::Jumpbridge, &[LinkType::Jumpbridge], true)));
    }

    #[test]
    fn test_jump_row_neighbor_names() {
        let row = JumpRow {
            system_id: 1,
            name: "Jita".into(),
            region_id: 10,
            constellation_id: 20,
            security: 0.9,
            jump_nodes: "perimeter: new caldari::".into(),
        };
        let names: Vec<_> = row.neighbor_names().collect();
        assert_eq!(names, vec!["PERIMETER", "NEW CALDARI"]);
    }
}
