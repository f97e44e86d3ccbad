//! kgwizard schema: typed entity model over a pluggable, explicitly registered schema.
//!
//! Raw records (usually language-model output) arrive as loosely typed JSON.
//! A [`Schema`] declares the closed set of vertex and edge types, and each
//! declared field carries an ordered list of candidate kinds. Building a
//! [`Connection`] resolves labels against the registry and coerces every
//! property through those candidates.

pub mod builtin;
pub mod descriptor;
pub mod entity;
pub mod registry;
pub mod value;

pub use descriptor::{EdgeType, FieldSpec, SchemaDefinition, VertexType};
pub use entity::{Connection, Edge, EntityError, FailureClass, Properties, Vertex};
pub use registry::Schema;
pub use value::{coerce, FieldKind};
