//! Error types for kgwizard.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Schema could not be loaded or failed validation. Fatal for a run.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Graph store error: {0}")]
    Store(String),

    #[error("Generation error: {0}")]
    Generation(String),

    /// An input record is unusable (missing runs, unreadable content).
    #[error("Record error: {0}")]
    Record(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a retry of the same operation could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Http(_) | Error::Generation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
