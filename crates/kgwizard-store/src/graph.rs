//! In-process property graph using petgraph.
//!
//! Used for `--address memory`, for tests, and for ad-hoc parsing runs that
//! only need an exported snapshot.

use async_trait::async_trait;
use kgwizard_core::{Error, Result};
use kgwizard_schema::Properties;
use parking_lot::Mutex;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde_json::Value;
use std::collections::HashMap;

use crate::store::GraphStore;
use crate::types::*;

#[derive(Debug, Clone)]
struct GraphNode {
    label: String,
    properties: Properties,
}

#[derive(Debug, Clone)]
struct GraphEdge {
    label: String,
    properties: Properties,
}

#[derive(Default)]
struct Inner {
    graph: DiGraph<GraphNode, GraphEdge>,
    /// label → nodes carrying it, in insertion order.
    label_index: HashMap<String, Vec<NodeIndex>>,
}

/// Thread-safe in-memory graph. Element ids are petgraph indices.
pub struct MemoryGraph {
    inner: Mutex<Inner>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Get graph statistics.
    pub fn stats(&self) -> GraphStats {
        let inner = self.inner.lock();
        GraphStats {
            vertex_count: inner.graph.node_count(),
            edge_count: inner.graph.edge_count(),
        }
    }

    fn node_index(inner: &Inner, handle: &VertexHandle) -> Result<NodeIndex> {
        let idx = handle
            .id
            .0
            .as_u64()
            .map(|i| NodeIndex::new(i as usize))
            .filter(|idx| inner.graph.node_weight(*idx).is_some())
            .ok_or_else(|| Error::NotFound(format!("vertex {}", handle.id)))?;
        Ok(idx)
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn node_id(idx: NodeIndex) -> ElementId {
    ElementId::from(idx.index() as u64)
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn find_vertex(
        &self,
        label: &str,
        properties: &Properties,
    ) -> Result<Option<VertexHandle>> {
        let inner = self.inner.lock();
        let found = inner.label_index.get(label).and_then(|nodes| {
            nodes
                .iter()
                .copied()
                .find(|idx| inner.graph[*idx].properties == *properties)
        });
        Ok(found.map(|idx| VertexHandle {
            id: node_id(idx),
            label: label.to_string(),
        }))
    }

    async fn insert_vertex(&self, label: &str, properties: &Properties) -> Result<VertexHandle> {
        let mut inner = self.inner.lock();
        let idx = inner.graph.add_node(GraphNode {
            label: label.to_string(),
            properties: properties.clone(),
        });
        inner
            .label_index
            .entry(label.to_string())
            .or_default()
            .push(idx);
        Ok(VertexHandle {
            id: node_id(idx),
            label: label.to_string(),
        })
    }

    async fn insert_edge(
        &self,
        label: &str,
        source: &VertexHandle,
        target: &VertexHandle,
        properties: &Properties,
    ) -> Result<EdgeHandle> {
        let mut inner = self.inner.lock();
        let src = Self::node_index(&inner, source)?;
        let tgt = Self::node_index(&inner, target)?;
        let idx = inner.graph.add_edge(
            src,
            tgt,
            GraphEdge {
                label: label.to_string(),
                properties: properties.clone(),
            },
        );
        Ok(EdgeHandle {
            id: ElementId::from(idx.index() as u64),
            label: label.to_string(),
        })
    }

    async fn vertex_values(&self, label: &str, key: &str) -> Result<Vec<Value>> {
        let inner = self.inner.lock();
        let values = inner
            .label_index
            .get(label)
            .map(|nodes| {
                nodes
                    .iter()
                    .filter_map(|idx| inner.graph[*idx].properties.get(key))
                    .filter(|v| !v.is_null())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(values)
    }

    async fn count_vertices(&self, label: Option<&str>) -> Result<usize> {
        let inner = self.inner.lock();
        Ok(match label {
            Some(label) => inner.label_index.get(label).map_or(0, Vec::len),
            None => inner.graph.node_count(),
        })
    }

    async fn count_edges(&self, label: Option<&str>) -> Result<usize> {
        let inner = self.inner.lock();
        Ok(match label {
            Some(label) => inner
                .graph
                .edge_weights()
                .filter(|e| e.label == label)
                .count(),
            None => inner.graph.edge_count(),
        })
    }

    async fn snapshot(&self) -> Result<GraphSnapshot> {
        let inner = self.inner.lock();
        let vertices = inner
            .graph
            .node_indices()
            .map(|idx| {
                let node = &inner.graph[idx];
                StoredVertex {
                    id: node_id(idx),
                    label: node.label.clone(),
                    properties: node.properties.clone(),
                }
            })
            .collect();
        let edges = inner
            .graph
            .edge_references()
            .map(|edge| StoredEdge {
                id: ElementId::from(edge.id().index() as u64),
                label: edge.weight().label.clone(),
                source: node_id(edge.source()),
                target: node_id(edge.target()),
                properties: edge.weight().properties.clone(),
            })
            .collect();
        Ok(GraphSnapshot {
            exported_at: chrono::Utc::now().to_rfc3339(),
            vertices,
            edges,
        })
    }
}
