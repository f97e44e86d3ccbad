//! Schema registry: label → type descriptor, validated once at load time.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use kgwizard_core::{Error, Result};
use tracing::{debug, info};

use crate::builtin;
use crate::descriptor::{EdgeType, SchemaDefinition, VertexType};

/// A validated, immutable set of vertex and edge types.
///
/// Shared between jobs behind an `Arc`; nothing in it changes after loading.
#[derive(Debug, Clone)]
pub struct Schema {
    definition: SchemaDefinition,
    vertex_index: HashMap<String, usize>,
    edge_index: HashMap<String, usize>,
}

impl Schema {
    /// Validate a definition and build its lookup tables.
    pub fn from_definition(definition: SchemaDefinition) -> Result<Self> {
        let mut vertex_index = HashMap::new();
        for (i, vertex) in definition.vertices.iter().enumerate() {
            check_fields(&vertex.label, &vertex.fields)?;
            if vertex_index.insert(vertex.label.clone(), i).is_some() {
                return Err(Error::Schema(format!(
                    "duplicate vertex label '{}' in schema '{}'",
                    vertex.label, definition.name
                )));
            }
        }

        let mut edge_index = HashMap::new();
        for (i, edge) in definition.edges.iter().enumerate() {
            check_fields(&edge.label, &edge.fields)?;
            if vertex_index.contains_key(&edge.label) {
                return Err(Error::Schema(format!(
                    "label '{}' is declared as both vertex and edge",
                    edge.label
                )));
            }
            for end in [&edge.source, &edge.target] {
                if !vertex_index.contains_key(end) {
                    return Err(Error::Schema(format!(
                        "edge '{}' refers to unknown vertex label '{}'",
                        edge.label, end
                    )));
                }
            }
            if edge_index.insert(edge.label.clone(), i).is_some() {
                return Err(Error::Schema(format!(
                    "duplicate edge label '{}' in schema '{}'",
                    edge.label, definition.name
                )));
            }
        }

        debug!(
            "Schema '{}' registered: {} vertex types, {} edge types",
            definition.name,
            vertex_index.len(),
            edge_index.len()
        );

        Ok(Self {
            definition,
            vertex_index,
            edge_index,
        })
    }

    /// Load a built-in schema by name, or a JSON definition from a path.
    pub fn load(name_or_path: &str) -> Result<Self> {
        if let Some(definition) = builtin::definition(name_or_path) {
            info!("Using built-in schema '{}'", name_or_path);
            return Self::from_definition(definition);
        }

        let path = Path::new(name_or_path);
        if !path.is_file() {
            return Err(Error::Schema(format!(
                "'{}' is neither a built-in schema ({}) nor a schema file",
                name_or_path,
                builtin::NAMES.join(", ")
            )));
        }
        Self::from_file(path)
    }

    /// Load a custom schema from a JSON definition file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let definition: SchemaDefinition = serde_json::from_str(&content)
            .map_err(|e| Error::Schema(format!("{}: {}", path.display(), e)))?;
        info!("Loaded schema '{}' from {}", definition.name, path.display());
        Self::from_definition(definition)
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    pub fn vertex_type(&self, label: &str) -> Option<&VertexType> {
        self.vertex_index
            .get(label)
            .map(|&i| &self.definition.vertices[i])
    }

    pub fn edge_type(&self, label: &str) -> Option<&EdgeType> {
        self.edge_index.get(label).map(|&i| &self.definition.edges[i])
    }

    /// Edge types declared from `source` to `target`.
    pub fn edges_between(&self, source: &str, target: &str) -> Vec<&EdgeType> {
        self.definition
            .edges
            .iter()
            .filter(|e| e.source == source && e.target == target)
            .collect()
    }

    /// Human/LLM-readable rendering of the schema, injected into prompts.
    pub fn describe(&self) -> String {
        serde_json::to_string_pretty(&self.definition).unwrap_or_default()
    }
}

fn check_fields(label: &str, fields: &[crate::FieldSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.types.is_empty() {
            return Err(Error::Schema(format!(
                "field '{}.{}' declares no candidate types",
                label, field.name
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(Error::Schema(format!(
                "field '{}.{}' declared twice",
                label, field.name
            )));
        }
    }
    if label.trim().is_empty() {
        return Err(Error::Schema("empty type label".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldKind, FieldSpec};

    fn tiny() -> SchemaDefinition {
        SchemaDefinition::new("tiny")
            .vertex("A", vec![FieldSpec::required("name", &[FieldKind::String])])
            .vertex("B", vec![])
            .edge("AtoB", "A", "B", vec![])
    }

    #[test]
    fn test_builtin_echem_loads() {
        let schema = Schema::load("echem").unwrap();
        assert_eq!(schema.name(), "echem");
        assert!(schema.vertex_type("Compound").is_some());
        assert!(schema.edge_type("HasReactant").is_some());
        assert_eq!(schema.edges_between("Study", "Reaction").len(), 1);
    }

    #[test]
    fn test_every_builtin_is_valid() {
        for name in builtin::NAMES {
            assert!(Schema::load(name).is_ok(), "builtin {} failed", name);
        }
    }

    #[test]
    fn test_unknown_name_is_fatal() {
        let err = Schema::load("no-such-schema").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_edge_to_unknown_vertex_rejected() {
        let def = tiny().edge("AtoC", "A", "C", vec![]);
        assert!(Schema::from_definition(def).is_err());
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let def = tiny().vertex("A", vec![]);
        assert!(Schema::from_definition(def).is_err());
    }

    #[test]
    fn test_field_without_candidates_rejected() {
        let def = tiny().vertex("C", vec![FieldSpec::required("x", &[])]);
        assert!(Schema::from_definition(def).is_err());
    }

    #[test]
    fn test_schema_from_file_round_trips_description() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.json");
        let schema = Schema::from_definition(tiny()).unwrap();
        std::fs::write(&path, schema.describe()).unwrap();

        let loaded = Schema::load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.definition(), schema.definition());
        let labels: Vec<_> = loaded
            .definition()
            .vertices
            .iter()
            .map(|v| v.label.as_str())
            .collect();
        assert_eq!(labels, vec!["A", "B"]);
    }
}
