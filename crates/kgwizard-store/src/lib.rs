//! kgwizard store: idempotent upsert of typed entities into a property graph.
//!
//! [`GraphStore`] is the small set of primitives a backend must offer;
//! [`GraphAdapter`] layers the create-or-fetch protocol on top of it.
//! Two backends ship: [`MemoryGraph`] (in-process, petgraph) and
//! [`GremlinStore`] (Gremlin Server over HTTP).

pub mod adapter;
pub mod graph;
pub mod graphson;
pub mod gremlin;
pub mod store;
pub mod types;

pub use adapter::GraphAdapter;
pub use graph::MemoryGraph;
pub use gremlin::GremlinStore;
pub use store::{open_store, GraphStore};
pub use types::*;
