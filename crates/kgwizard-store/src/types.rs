//! Handles and snapshot types shared by all graph backends.

use kgwizard_schema::Properties;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend-assigned identifier of a vertex or edge.
///
/// Kept as raw JSON: in-memory ids are integers, Gremlin servers may return
/// longs, strings or structured relation ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub Value);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        ElementId(Value::from(id))
    }
}

/// A vertex that exists in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexHandle {
    pub id: ElementId,
    pub label: String,
}

/// An edge that exists in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeHandle {
    pub id: ElementId,
    pub label: String,
}

/// A vertex as exported in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVertex {
    pub id: ElementId,
    pub label: String,
    #[serde(default)]
    pub properties: Properties,
}

/// An edge as exported in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEdge {
    pub id: ElementId,
    pub label: String,
    pub source: ElementId,
    pub target: ElementId,
    #[serde(default)]
    pub properties: Properties,
}

/// Portable dump of a whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub exported_at: String,
    pub vertices: Vec<StoredVertex>,
    pub edges: Vec<StoredEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub vertex_count: usize,
    pub edge_count: usize,
}
