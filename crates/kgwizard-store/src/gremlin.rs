//! Gremlin Server backend over the HTTP channel.
//!
//! Every traversal is sent as a Groovy script with all labels, keys and
//! values passed as bindings, never interpolated into the script text.

use async_trait::async_trait;
use kgwizard_core::{Error, GraphConfig, Result};
use kgwizard_schema::Properties;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::graphson::{flatten_value_map, untype};
use crate::store::GraphStore;
use crate::types::*;

/// A script plus its bindings, built incrementally.
#[derive(Debug, Default)]
pub(crate) struct Script {
    pub text: String,
    pub bindings: Map<String, Value>,
}

impl Script {
    fn new(prefix: &str) -> Self {
        Self {
            text: prefix.to_string(),
            bindings: Map::new(),
        }
    }

    /// Register a binding and return its name.
    fn bind(&mut self, value: impl Into<Value>) -> String {
        let name = format!("b{}", self.bindings.len());
        self.bindings.insert(name.clone(), value.into());
        name
    }

    fn push(&mut self, step: &str) -> &mut Self {
        self.text.push_str(step);
        self
    }

    /// `.has(k, v)` per property; null values become `.hasNot(k)`.
    fn has_all(&mut self, properties: &Properties) -> &mut Self {
        for (key, value) in properties {
            let k = self.bind(key.as_str());
            if value.is_null() {
                self.push(&format!(".hasNot({})", k));
            } else {
                let v = self.bind(value.clone());
                self.push(&format!(".has({}, {})", k, v));
            }
        }
        self
    }

    /// `.property(k, v)` per non-null property.
    fn set_all(&mut self, properties: &Properties) -> &mut Self {
        for (key, value) in properties.iter().filter(|(_, v)| !v.is_null()) {
            let k = self.bind(key.as_str());
            let v = self.bind(value.clone());
            self.push(&format!(".property({}, {})", k, v));
        }
        self
    }

    fn has_label(&mut self, label: Option<&str>) -> &mut Self {
        if let Some(label) = label {
            let l = self.bind(label);
            self.push(&format!(".hasLabel({})", l));
        }
        self
    }
}

pub(crate) fn find_vertex_script(label: &str, properties: &Properties) -> Script {
    let mut s = Script::new("g.V()");
    s.has_label(Some(label)).has_all(properties).push(".limit(1).id()");
    s
}

pub(crate) fn insert_vertex_script(label: &str, properties: &Properties) -> Script {
    let mut s = Script::new("");
    let l = s.bind(label);
    s.push(&format!("g.addV({})", l))
        .set_all(properties)
        .push(".id()");
    s
}

pub(crate) fn insert_edge_script(
    label: &str,
    source: &ElementId,
    target: &ElementId,
    properties: &Properties,
) -> Script {
    let mut s = Script::new("");
    let src = s.bind(source.0.clone());
    let tgt = s.bind(target.0.clone());
    let l = s.bind(label);
    s.push(&format!(
        "g.V({}).as('src').V({}).addE({}).from('src')",
        src, tgt, l
    ))
    .set_all(properties)
    .push(".id()");
    s
}

/// Gremlin Server client.
pub struct GremlinStore {
    client: reqwest::Client,
    endpoint: String,
    graph_name: String,
}

impl GremlinStore {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint()?,
            graph_name: config.graph_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit a script and return the untyped `result.data` list.
    async fn submit(&self, script: Script) -> Result<Vec<Value>> {
        debug!("gremlin: {}", script.text);
        let body = json!({
            "gremlin": script.text,
            "bindings": script.bindings,
            "aliases": { "g": self.graph_name },
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Store(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| Error::Store(format!("unreadable server response: {}", e)))?;

        if !status.is_success() {
            let message = payload
                .pointer("/status/message")
                .or_else(|| payload.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(Error::Store(format!("server returned {}: {}", status, message)));
        }

        match untype(payload.pointer("/result/data").cloned().unwrap_or(Value::Null)) {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }

    async fn count(&self, prefix: &str, label: Option<&str>) -> Result<usize> {
        let mut s = Script::new(prefix);
        s.has_label(label).push(".count()");
        let data = self.submit(s).await?;
        data.first()
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .ok_or_else(|| Error::Store("count returned no number".into()))
    }
}

fn single_id(data: Vec<Value>, what: &str) -> Result<ElementId> {
    data.into_iter()
        .next()
        .map(ElementId)
        .ok_or_else(|| Error::Store(format!("{} returned no id", what)))
}

fn properties_of(value: Option<&Value>) -> Properties {
    value
        .cloned()
        .map(flatten_value_map)
        .map(|m| m.into_iter().collect())
        .unwrap_or_default()
}

fn string_of(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

fn id_of(value: Option<&Value>) -> ElementId {
    ElementId(value.cloned().unwrap_or(Value::Null))
}

#[async_trait]
impl GraphStore for GremlinStore {
    async fn find_vertex(
        &self,
        label: &str,
        properties: &Properties,
    ) -> Result<Option<VertexHandle>> {
        let data = self.submit(find_vertex_script(label, properties)).await?;
        Ok(data.into_iter().next().map(|id| VertexHandle {
            id: ElementId(id),
            label: label.to_string(),
        }))
    }

    async fn insert_vertex(&self, label: &str, properties: &Properties) -> Result<VertexHandle> {
        let data = self.submit(insert_vertex_script(label, properties)).await?;
        Ok(VertexHandle {
            id: single_id(data, "addV")?,
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
        let script = insert_edge_script(label, &source.id, &target.id, properties);
        let data = self.submit(script).await?;
        Ok(EdgeHandle {
            id: single_id(data, "addE")?,
            label: label.to_string(),
        })
    }

    async fn vertex_values(&self, label: &str, key: &str) -> Result<Vec<Value>> {
        let mut s = Script::new("g.V()");
        s.has_label(Some(label));
        let k = s.bind(key);
        s.push(&format!(".values({})", k));
        self.submit(s).await
    }

    async fn count_vertices(&self, label: Option<&str>) -> Result<usize> {
        self.count("g.V()", label).await
    }

    async fn count_edges(&self, label: Option<&str>) -> Result<usize> {
        self.count("g.E()", label).await
    }

    async fn snapshot(&self) -> Result<GraphSnapshot> {
        let vertices = self
            .submit(Script::new(
                "g.V().project('id', 'label', 'properties')\
                 .by(T.id).by(T.label).by(__.valueMap())",
            ))
            .await?
            .into_iter()
            .map(|v| StoredVertex {
                id: id_of(v.get("id")),
                label: string_of(v.get("label")),
                properties: properties_of(v.get("properties")),
            })
            .collect();

        let edges = self
            .submit(Script::new(
                "g.E().project('id', 'label', 'source', 'target', 'properties')\
                 .by(T.id).by(T.label).by(__.outV().id()).by(__.inV().id()).by(__.valueMap())",
            ))
            .await?
            .into_iter()
            .map(|e| StoredEdge {
                id: id_of(e.get("id")),
                label: string_of(e.get("label")),
                source: id_of(e.get("source")),
                target: id_of(e.get("target")),
                properties: properties_of(e.get("properties")),
            })
            .collect();

        Ok(GraphSnapshot {
            exported_at: chrono::Utc::now().to_rfc3339(),
            vertices,
            edges,
        })
    }
}
