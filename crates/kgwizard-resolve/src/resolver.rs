//! Graph-backed substitution resolver.

use std::collections::HashMap;

use kgwizard_store::GraphAdapter;
use tracing::{debug, warn};

use crate::types::SubstitutionRequest;

/// Holds the requested `token:Label` pairs for a run.
#[derive(Clone)]
pub struct RagResolver {
    adapter: GraphAdapter,
    requests: Vec<SubstitutionRequest>,
}

impl RagResolver {
    pub fn new(adapter: GraphAdapter, requests: Vec<SubstitutionRequest>) -> Self {
        Self { adapter, requests }
    }

    pub fn is_active(&self) -> bool {
        !self.requests.is_empty()
    }

    pub async fn resolve(&self) -> HashMap<String, String> {
        build_substitutions(&self.adapter, &self.requests).await
    }
}

/// Query the current names for each requested label, joined with `", "`.
///
/// Tokens whose label has no named vertices are left out, as are tokens
/// whose lookup failed (logged, never fatal).
pub async fn build_substitutions(
    adapter: &GraphAdapter,
    requests: &[SubstitutionRequest],
) -> HashMap<String, String> {
    let mut subs = HashMap::new();
    for request in requests {
        match adapter.list_names_by_type(&request.label).await {
            Ok(names) if names.is_empty() => {
                debug!("No {} names yet for {{{}}}", request.label, request.token);
            }
            Ok(names) => {
                debug!(
                    "{{{}}} ← {} {} names",
                    request.token,
                    names.len(),
                    request.label
                );
                subs.insert(request.token.clone(), names.join(", "));
            }
            Err(e) => {
                warn!("Substitution {} skipped: {}", request, e);
            }
        }
    }
    subs
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kgwizard_core::{Error, Result};
    use kgwizard_schema::{Properties, Schema, Vertex};
    use kgwizard_store::*;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn seeded() -> GraphAdapter {
        let schema = Schema::load("echem").unwrap();
        let adapter = GraphAdapter::new(Arc::new(MemoryGraph::new()));
        for name in ["water", "MeCN"] {
            let v = Vertex::from_node(&schema, &json!({"label": "Compound", "name": name})).unwrap();
            adapter.get_or_create_vertex(&v, false).await.unwrap();
        }
        adapter
    }

    fn req(s: &str) -> SubstitutionRequest {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_names_are_joined() {
        let adapter = seeded().await;
        let subs = build_substitutions(&adapter, &[req("compounds:Compound")]).await;
        assert_eq!(subs["compounds"], "water, MeCN");
    }

    #[tokio::test]
    async fn test_empty_label_is_omitted() {
        let adapter = seeded().await;
        let resolver = RagResolver::new(
            adapter,
            vec![req("compounds:Compound"), req("materials:Material")],
        );
        assert!(resolver.is_active());
        let subs = resolver.resolve().await;
        assert_eq!(subs.len(), 1);
        assert!(!subs.contains_key("materials"));
    }

    #[tokio::test]
    async fn test_inactive_without_requests() {
        let resolver = RagResolver::new(GraphAdapter::new(Arc::new(MemoryGraph::new())), vec![]);
        assert!(!resolver.is_active());
        assert!(resolver.resolve().await.is_empty());
    }

    /// A store whose value lookups always fail.
    struct Unreachable;

    #[async_trait]
    impl GraphStore for Unreachable {
        async fn find_vertex(&self, _: &str, _: &Properties) -> Result<Option<VertexHandle>> {
            Err(Error::Store("down".into()))
        }
        async fn insert_vertex(&self, _: &str, _: &Properties) -> Result<VertexHandle> {
            Err(Error::Store("down".into()))
        }
        async fn insert_edge(
            &self,
            _: &str,
            _: &VertexHandle,
            _: &VertexHandle,
            _: &Properties,
        ) -> Result<EdgeHandle> {
            Err(Error::Store("down".into()))
        }
        async fn vertex_values(&self, _: &str, _: &str) -> Result<Vec<Value>> {
            Err(Error::Store("down".into()))
        }
        async fn count_vertices(&self, _: Option<&str>) -> Result<usize> {
            Err(Error::Store("down".into()))
        }
        async fn count_edges(&self, _: Option<&str>) -> Result<usize> {
            Err(Error::Store("down".into()))
        }
        async fn snapshot(&self) -> Result<GraphSnapshot> {
            Err(Error::Store("down".into()))
        }
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_fatal() {
        let adapter = GraphAdapter::new(Arc::new(Unreachable));
        let subs = build_substitutions(&adapter, &[req("compounds:Compound")]).await;
        assert!(subs.is_empty());
    }
}
