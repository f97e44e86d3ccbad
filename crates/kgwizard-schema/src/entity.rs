//! Vertices, edges and connections built from raw JSON against a [`Schema`].

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::descriptor::FieldSpec;
use crate::registry::Schema;
use crate::value::coerce;

/// Declared field name → coerced value, ordered by name.
pub type Properties = BTreeMap<String, Value>;

/// The two buckets per-item failures are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureClass {
    /// Structural problems: wrong nesting, unknown labels.
    Type,
    /// A field the type requires is absent, or one it lacks is present.
    Key,
}

/// Why a raw item could not become a typed entity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error("unknown label '{0}'")]
    UnknownLabel(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("{label} is missing required field '{field}'")]
    MissingField { label: String, field: String },

    #[error("{label} has no field '{field}'")]
    UnknownField { label: String, field: String },
}

impl EntityError {
    pub fn class(&self) -> FailureClass {
        match self {
            EntityError::UnknownLabel(_) | EntityError::ShapeMismatch(_) => FailureClass::Type,
            EntityError::MissingField { .. } | EntityError::UnknownField { .. } => {
                FailureClass::Key
            }
        }
    }
}

/// A typed graph node. Equality is structural: label plus every property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
    label: String,
    properties: Properties,
}

impl Vertex {
    /// Build a vertex of type `label` from a flat property map.
    pub fn from_dict(
        schema: &Schema,
        label: &str,
        properties: &Map<String, Value>,
    ) -> Result<Self, EntityError> {
        let vertex_type = schema
            .vertex_type(label)
            .ok_or_else(|| EntityError::UnknownLabel(label.to_string()))?;
        Ok(Self {
            label: vertex_type.label.clone(),
            properties: coerce_fields(label, &vertex_type.fields, properties)?,
        })
    }

    /// Build a vertex from a nested node object:
    /// `{"label": .., "properties": {..}}` or `{"label": .., <flattened keys>}`.
    pub fn from_node(schema: &Schema, node: &Value) -> Result<Self, EntityError> {
        let node = node
            .as_object()
            .ok_or_else(|| EntityError::ShapeMismatch("vertex is not an object".into()))?;
        let label = label_of(node)?;

        match node.get("properties") {
            Some(Value::Object(properties)) => Self::from_dict(schema, label, properties),
            Some(other) => Err(EntityError::ShapeMismatch(format!(
                "properties of '{}' must be an object, got {}",
                label,
                kind_of(other)
            ))),
            None => {
                let flattened: Map<String, Value> = node
                    .iter()
                    .filter(|(k, _)| k.as_str() != "label")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Self::from_dict(schema, label, &flattened)
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// `name` property as text, if the type has one.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "label": self.label,
            "properties": self.properties,
        })
    }
}

/// A typed relation. It names its endpoint labels; the vertices themselves
/// belong to the [`Connection`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    label: String,
    source: String,
    target: String,
    properties: Properties,
}

impl Edge {
    /// Build an edge of type `label` between `source` and `target`.
    ///
    /// The endpoints must carry the labels the edge type declares.
    pub fn from_dict(
        schema: &Schema,
        label: &str,
        properties: &Map<String, Value>,
        source: &Vertex,
        target: &Vertex,
    ) -> Result<Self, EntityError> {
        let edge_type = schema
            .edge_type(label)
            .ok_or_else(|| EntityError::UnknownLabel(label.to_string()))?;

        if edge_type.source != source.label || edge_type.target != target.label {
            return Err(EntityError::ShapeMismatch(format!(
                "{} connects {} -> {}, got {} -> {}",
                label, edge_type.source, edge_type.target, source.label, target.label
            )));
        }

        Ok(Self {
            label: edge_type.label.clone(),
            source: source.label.clone(),
            target: target.label.clone(),
            properties: coerce_fields(label, &edge_type.fields, properties)?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source_label(&self) -> &str {
        &self.source
    }

    pub fn target_label(&self) -> &str {
        &self.target
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "source": self.source,
            "target": self.target,
            "label": self.label,
            "properties": self.properties,
        })
    }
}

/// One atomic fact: source vertex, target vertex and the edge between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub source: Vertex,
    pub target: Vertex,
    pub edge: Edge,
}

impl Connection {
    /// Build a connection from
    /// `{"source": {..}, "target": {..}, "label"?: .., "properties"?: {..}}`.
    ///
    /// Without an explicit `label`, the edge type is the one declared between
    /// the two endpoint labels; zero or several candidates is a shape error.
    pub fn from_dict(schema: &Schema, raw: &Value) -> Result<Self, EntityError> {
        let raw = raw
            .as_object()
            .ok_or_else(|| EntityError::ShapeMismatch("connection is not an object".into()))?;

        let source = Vertex::from_node(schema, required_key(raw, "source")?)?;
        let target = Vertex::from_node(schema, required_key(raw, "target")?)?;

        let edge_label = match raw.get("label") {
            Some(_) => label_of(raw)?.to_string(),
            None => infer_edge_label(schema, &source, &target)?,
        };

        let empty = Map::new();
        let properties = match raw.get("properties") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(p)) => p,
            Some(other) => {
                return Err(EntityError::ShapeMismatch(format!(
                    "edge properties must be an object, got {}",
                    kind_of(other)
                )))
            }
        };

        let edge = Edge::from_dict(schema, &edge_label, properties, &source, &target)?;
        Ok(Self {
            source,
            target,
            edge,
        })
    }
}

fn coerce_fields(
    label: &str,
    fields: &[FieldSpec],
    raw: &Map<String, Value>,
) -> Result<Properties, EntityError> {
    if let Some(unknown) = raw.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
        return Err(EntityError::UnknownField {
            label: label.to_string(),
            field: unknown.clone(),
        });
    }

    let mut properties = Properties::new();
    for field in fields {
        let value = match raw.get(&field.name) {
            Some(v) => coerce(&field.types, v),
            None if field.optional => Value::Null,
            None => {
                return Err(EntityError::MissingField {
                    label: label.to_string(),
                    field: field.name.clone(),
                })
            }
        };
        properties.insert(field.name.clone(), value);
    }
    Ok(properties)
}

fn infer_edge_label(schema: &Schema, source: &Vertex, target: &Vertex) -> Result<String, EntityError> {
    let candidates = schema.edges_between(&source.label, &target.label);
    match candidates.as_slice() {
        [only] => Ok(only.label.clone()),
        [] => Err(EntityError::ShapeMismatch(format!(
            "no edge type from {} to {}",
            source.label, target.label
        ))),
        _ => Err(EntityError::ShapeMismatch(format!(
            "edge label required: {} edge types from {} to {}",
            candidates.len(),
            source.label,
            target.label
        ))),
    }
}

fn required_key<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, EntityError> {
    obj.get(key)
        .ok_or_else(|| EntityError::ShapeMismatch(format!("missing '{}'", key)))
}

fn label_of(obj: &Map<String, Value>) -> Result<&str, EntityError> {
    match obj.get("label") {
        Some(Value::String(label)) => Ok(label),
        Some(other) => Err(EntityError::ShapeMismatch(format!(
            "label must be a string, got {}",
            kind_of(other)
        ))),
        None => Err(EntityError::ShapeMismatch("missing 'label'".into())),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
