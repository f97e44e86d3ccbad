//! RAG substitutions.
//!
//! Before a generation turn, the names of entities already in the graph are
//! fetched per requested vertex label and handed to the prompt template, so
//! the model reuses them instead of inventing near-duplicates.

pub mod resolver;
pub mod types;

pub use resolver::{build_substitutions, RagResolver};
pub use types::*;
