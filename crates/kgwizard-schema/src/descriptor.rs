//! Declarative vertex and edge type descriptors.
//!
//! A [`SchemaDefinition`] is plain data: built-in schemas construct it in code,
//! custom schemas deserialize it from a JSON file with the same shape.

use serde::{Deserialize, Serialize};

use crate::value::FieldKind;

/// A declared field with its ordered candidate kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Candidate kinds, tried in order during coercion.
    pub types: Vec<FieldKind>,
    /// Optional fields default to `null` when absent from the input.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl FieldSpec {
    pub fn required(name: &str, types: &[FieldKind]) -> Self {
        Self {
            name: name.to_string(),
            types: types.to_vec(),
            optional: false,
        }
    }

    pub fn optional(name: &str, types: &[FieldKind]) -> Self {
        Self {
            name: name.to_string(),
            types: types.to_vec(),
            optional: true,
        }
    }
}

/// A vertex type: label plus declared fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexType {
    pub label: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// An edge type between two vertex labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeType {
    pub label: String,
    /// Vertex label accepted on the source end.
    pub source: String,
    /// Vertex label accepted on the target end.
    pub target: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Serializable description of a whole schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub vertices: Vec<VertexType>,
    #[serde(default)]
    pub edges: Vec<EdgeType>,
}

impl SchemaDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Register a vertex type.
    pub fn vertex(mut self, label: &str, fields: Vec<FieldSpec>) -> Self {
        self.vertices.push(VertexType {
            label: label.to_string(),
            fields,
        });
        self
    }

    /// Register an edge type from `source` to `target`.
    pub fn edge(mut self, label: &str, source: &str, target: &str, fields: Vec<FieldSpec>) -> Self {
        self.edges.push(EdgeType {
            label: label.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            fields,
        });
        self
    }
}
