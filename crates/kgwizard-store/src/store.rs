//! The primitive operations a property-graph backend must provide.

use std::sync::Arc;

use async_trait::async_trait;
use kgwizard_core::{GraphConfig, Result};
use kgwizard_schema::Properties;
use serde_json::Value;
use tracing::info;

use crate::graph::MemoryGraph;
use crate::gremlin::GremlinStore;
use crate::types::{EdgeHandle, GraphSnapshot, VertexHandle};

/// Backend primitives. Upsert semantics live in [`crate::GraphAdapter`].
///
/// Implementations must be safe to call from many tasks at once. No
/// operation here spans more than one element, so callers get no
/// multi-element atomicity.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// A vertex with exactly this label and these property values.
    async fn find_vertex(&self, label: &str, properties: &Properties)
        -> Result<Option<VertexHandle>>;

    /// Unconditionally create a vertex.
    async fn insert_vertex(&self, label: &str, properties: &Properties) -> Result<VertexHandle>;

    /// Unconditionally create an edge from `source` to `target`.
    async fn insert_edge(
        &self,
        label: &str,
        source: &VertexHandle,
        target: &VertexHandle,
        properties: &Properties,
    ) -> Result<EdgeHandle>;

    /// Values of property `key` over all vertices labelled `label`.
    async fn vertex_values(&self, label: &str, key: &str) -> Result<Vec<Value>>;

    async fn count_vertices(&self, label: Option<&str>) -> Result<usize>;

    async fn count_edges(&self, label: Option<&str>) -> Result<usize>;

    /// Every vertex and edge currently stored.
    async fn snapshot(&self) -> Result<GraphSnapshot>;
}

/// Open the backend selected by `config`.
pub fn open_store(config: &GraphConfig) -> Result<Arc<dyn GraphStore>> {
    if config.is_memory() {
        info!("Using in-process graph");
        return Ok(Arc::new(MemoryGraph::new()));
    }
    let store = GremlinStore::new(config)?;
    info!(
        "Using Gremlin server at {} (graph '{}')",
        store.endpoint(),
        config.graph_name
    );
    Ok(Arc::new(store))
}
