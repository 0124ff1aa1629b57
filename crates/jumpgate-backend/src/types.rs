//! Shared types for route search.

use jumpgate_core::{coerce_id, CollectionId, CollectionIds, LinkFilterSpec, NodeId};
use serde::{Deserialize, Deserializer, Serialize};

/// Identity of whoever issued a batch, passed through to access checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
}

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The operator running the local CLI.
    pub fn local() -> Self {
        Self::new("local")
    }
}

/// A collection the caller may read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: CollectionId,
    pub name: String,
}

/// Which branch produced a [`RouteResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    External,
    Local,
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// One hop of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEntry {
    pub name: String,
    /// Security status; `None` when the node is not in the catalog
    pub security: Option<f64>,
}

/// Outcome of one route search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub found: bool,
    pub jump_count: usize,
    pub max_depth: usize,
    pub depth_searched: usize,
    pub search_type: SearchType,
    pub path: Vec<PathEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RouteResult {
    /// An empty, not-found result.
    pub fn new(search_type: SearchType, max_depth: usize) -> Self {
        Self {
            found: false,
            jump_count: 0,
            max_depth,
            depth_searched: 0,
            search_type,
            path: Vec::new(),
            error: None,
        }
    }

    /// A not-found result carrying an error message.
    pub fn failed(search_type: SearchType, max_depth: usize, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(search_type, max_depth)
        }
    }
}

/// Parameters of a single route search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteQuery {
    pub from: NodeId,
    pub to: NodeId,
    /// Expansion ceiling; 0 selects the configured default
    pub max_depth: usize,
    pub collections: CollectionIds,
    pub filter: LinkFilterSpec,
}

// ============================================================================
// Batch wire shapes
// ============================================================================

/// A route endpoint as sent by clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub system_id: NodeId,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, system_id: NodeId) -> Self {
        Self {
            name: name.into(),
            system_id,
        }
    }
}

/// One entry of a batch request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(default)]
    pub collection_ids: CollectionIds,
    #[serde(flatten)]
    pub filter: LinkFilterSpec,
    #[serde(default)]
    pub skip_search: bool,
}

/// A batch of route requests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub route_data: Vec<RouteRequest>,
}

/// One entry of a batch response.
///
/// Request fields are echoed whether or not a search ran; the route fields
/// are present only when it did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub from: Endpoint,
    pub to: Endpoint,
    pub skip_search: bool,
    /// Accessible collections
    pub collections: Vec<CollectionInfo>,
    pub collection_ids: Vec<CollectionId>,
    #[serde(flatten)]
    pub filter: LinkFilterSpec,
    #[serde(flatten)]
    pub result: Option<RouteResult>,
}

/// Response to a [`BatchRequest`], in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub routes_data: Vec<RouteResponse>,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_id(&value)
        .filter(|id| *id > 0)
        .map(|id| id as NodeId)
        .unwrap_or(0))
}
