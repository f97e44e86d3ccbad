//! Create-or-fetch protocol over a [`GraphStore`].
//!
//! Writing the same vertex twice yields one vertex. A connection is written
//! endpoints first; if either endpoint fails, no edge is attempted.
//! Concurrent writers may race between the existence check and the insert
//! (the store offers no multi-step transaction), which can leave duplicate
//! vertices. Edges are never deduplicated.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use kgwizard_core::{Error, Result};
use kgwizard_schema::{Connection, Edge, Vertex};
use serde_json::Value;
use tracing::{debug, info};

use crate::store::GraphStore;
use crate::types::{EdgeHandle, GraphSnapshot, GraphStats, VertexHandle};

#[derive(Clone)]
pub struct GraphAdapter {
    store: Arc<dyn GraphStore>,
}

impl GraphAdapter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Return the vertex matching `vertex` exactly, creating it if absent.
    ///
    /// With `force` the lookup is skipped and a new vertex is always created.
    pub async fn get_or_create_vertex(&self, vertex: &Vertex, force: bool) -> Result<VertexHandle> {
        if !force {
            if let Some(existing) = self
                .store
                .find_vertex(vertex.label(), vertex.properties())
                .await?
            {
                debug!("Reusing {} vertex {}", vertex.label(), existing.id);
                return Ok(existing);
            }
        }
        let created = self
            .store
            .insert_vertex(vertex.label(), vertex.properties())
            .await?;
        debug!("Created {} vertex {}", vertex.label(), created.id);
        Ok(created)
    }

    /// Create `edge` between two existing vertices.
    pub async fn get_or_create_edge(
        &self,
        edge: &Edge,
        source: &VertexHandle,
        target: &VertexHandle,
    ) -> Result<EdgeHandle> {
        if source.label != edge.source_label() || target.label != edge.target_label() {
            return Err(Error::Store(format!(
                "edge {} expects {} -> {}, got {} -> {}",
                edge.label(),
                edge.source_label(),
                edge.target_label(),
                source.label,
                target.label
            )));
        }
        self.store
            .insert_edge(edge.label(), source, target, edge.properties())
            .await
    }

    /// Upsert both endpoints, then the edge between them.
    pub async fn add_connection(&self, connection: &Connection) -> Result<EdgeHandle> {
        let source = self.get_or_create_vertex(&connection.source, false).await?;
        let target = self.get_or_create_vertex(&connection.target, false).await?;
        self.get_or_create_edge(&connection.edge, &source, &target)
            .await
    }

    /// Distinct `name` values of every vertex with `label`, in first-seen order.
    pub async fn list_names_by_type(&self, label: &str) -> Result<Vec<String>> {
        let values = self.store.vertex_values(label, "name").await?;
        let mut seen = HashSet::with_capacity(values.len());
        let mut names: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            let name = match value {
                Value::String(s) => s,
                Value::Null => continue,
                other => other.to_string(),
            };
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
        Ok(names)
    }

    pub async fn stats(&self) -> Result<GraphStats> {
        Ok(GraphStats {
            vertex_count: self.store.count_vertices(None).await?,
            edge_count: self.store.count_edges(None).await?,
        })
    }

    /// Write a JSON snapshot of the whole graph to `path`.
    pub async fn export_graph(&self, path: &Path) -> Result<GraphSnapshot> {
        let snapshot = self.store.snapshot().await?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        info!(
            "Exported {} vertices and {} edges to {}",
            snapshot.vertices.len(),
            snapshot.edges.len(),
            path.display()
        );
        Ok(snapshot)
    }
}
